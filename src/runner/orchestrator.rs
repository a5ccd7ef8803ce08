//! Driving many names through workers.

use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::error::{RevdepError, Result};

use super::{Outcome, RunContext, Worker};

/// Reason reported for names a worker took but never answered for.
pub const LOST_WORKER_REASON: &str = "worker exited before reporting";

enum PoolRun {
    Completed,
    Unavailable,
}

/// Runs names sequentially or across a bounded pool of worker threads.
///
/// Outcomes are handed to the caller's callback on the calling thread, one
/// at a time, so whatever it writes to has a single writer. Sequential
/// runs report in input order; pooled runs report in completion order.
pub struct Orchestrator<'a> {
    ctx: &'a RunContext,
    workers: usize,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator. `workers` above one enables the pool.
    pub fn new(ctx: &'a RunContext, workers: usize) -> Self {
        Self {
            ctx,
            workers: workers.max(1),
        }
    }

    /// Whether names run concurrently.
    pub fn is_parallel(&self) -> bool {
        self.workers > 1
    }

    /// Process every name, reporting each exactly once.
    ///
    /// Only a callback error or a worker that cannot be started once the
    /// pool is up ends the run early.
    pub fn run<F>(&self, names: &[String], mut on_outcome: F) -> Result<()>
    where
        F: FnMut(Outcome) -> Result<()>,
    {
        if !self.is_parallel() || names.len() < 2 {
            return self.run_sequential(names, &mut on_outcome);
        }
        match self.run_pool(names, &mut on_outcome)? {
            PoolRun::Completed => Ok(()),
            PoolRun::Unavailable => self.run_sequential(names, &mut on_outcome),
        }
    }

    fn run_sequential<F>(&self, names: &[String], on_outcome: &mut F) -> Result<()>
    where
        F: FnMut(Outcome) -> Result<()>,
    {
        let mut worker = Worker::new(self.ctx);
        for name in names {
            on_outcome(worker.process(name))?;
        }
        Ok(())
    }

    fn run_pool<F>(&self, names: &[String], on_outcome: &mut F) -> Result<PoolRun>
    where
        F: FnMut(Outcome) -> Result<()>,
    {
        let (job_tx, job_rx) = mpsc::channel::<String>();
        for name in names {
            // The receiver is alive until the end of this function.
            let _ = job_tx.send(name.clone());
        }
        drop(job_tx);
        let jobs = Mutex::new(job_rx);
        let (result_tx, result_rx) = mpsc::channel::<Outcome>();
        let pool_size = self.workers.min(names.len());
        let ctx = self.ctx;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(pool_size);
            for id in 1..=pool_size {
                let jobs = &jobs;
                let results = result_tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("revdep-worker-{}", id))
                    .spawn_scoped(scope, move || {
                        let mut worker = Worker::new(ctx);
                        loop {
                            let next = jobs.lock().unwrap_or_else(PoisonError::into_inner).recv();
                            let Ok(name) = next else { break };
                            if results.send(worker.process(&name)).is_err() {
                                break;
                            }
                        }
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) if handles.is_empty() => {
                        tracing::warn!("Worker pool unavailable ({}), running sequentially", e);
                        return Ok(PoolRun::Unavailable);
                    }
                    Err(e) => {
                        return Err(RevdepError::WorkerSpawn {
                            message: e.to_string(),
                        })
                    }
                }
            }
            drop(result_tx);
            tracing::debug!("Started {} workers", handles.len());

            let mut pending: Vec<&String> = names.iter().collect();
            for outcome in result_rx {
                if let Some(pos) = pending.iter().position(|name| **name == outcome.name) {
                    pending.remove(pos);
                }
                on_outcome(outcome)?;
            }

            for handle in handles {
                if handle.join().is_err() {
                    tracing::warn!("A worker panicked");
                }
            }
            for name in pending {
                on_outcome(Outcome::failed(name.as_str(), LOST_WORKER_REASON))?;
            }
            Ok(PoolRun::Completed)
        })
    }
}
