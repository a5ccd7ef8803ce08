//! The isolated installation root shared by a run.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RevdepError, Result};

/// Directory that recursively installed prerequisites go into.
///
/// The build tools only take their install location from the environment,
/// so the root carries the variables pointing them at it. Those variables
/// are handed to each child process through
/// [`CommandOptions`](crate::shell::CommandOptions) and are never set on
/// this process.
///
/// Unless asked to keep it, a root this run created is removed when the
/// value is dropped. A directory that already existed is never removed.
#[derive(Debug)]
pub struct InstallRoot {
    path: PathBuf,
    remove_on_drop: bool,
    env: HashMap<String, String>,
}

impl InstallRoot {
    /// Create the root at `location`, or in a fresh temporary directory.
    pub fn create(location: Option<&Path>, keep: bool) -> Result<Self> {
        let (path, created) = match location {
            Some(dir) => {
                let existed = dir.exists();
                fs::create_dir_all(dir)?;
                (dir.to_path_buf(), !existed)
            }
            None => {
                let dir = tempfile::Builder::new().prefix("revdep-").tempdir()?;
                (dir.keep(), true)
            }
        };

        let env = install_env(&path, |key| std::env::var_os(key))?;
        tracing::debug!("Installation root at {}", path.display());

        Ok(Self {
            path,
            remove_on_drop: created && !keep,
            env,
        })
    }

    /// Path of the root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment directing installs at this root and making them loadable.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Whether the directory survives the end of the run.
    pub fn is_kept(&self) -> bool {
        !self.remove_on_drop
    }
}

impl Drop for InstallRoot {
    fn drop(&mut self) {
        if !self.remove_on_drop {
            tracing::info!("Leaving installation root at {}", self.path.display());
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            tracing::warn!(
                "Failed to remove installation root {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Build the install environment for `root`, layered over `inherited`.
fn install_env(
    root: &Path,
    inherited: impl Fn(&str) -> Option<OsString>,
) -> Result<HashMap<String, String>> {
    let lib = root.join("lib").join("perl5");
    let bin = root.join("bin");

    let mut env = HashMap::new();
    env.insert(
        "PERL_MM_OPT".to_string(),
        format!("INSTALL_BASE={}", root.display()),
    );
    env.insert(
        "PERL_MB_OPT".to_string(),
        format!("--install_base {}", root.display()),
    );
    env.insert("PERL5LIB".to_string(), prepend(&lib, inherited("PERL5LIB"))?);
    env.insert("PATH".to_string(), prepend(&bin, inherited("PATH"))?);
    env.insert("PERL_MM_USE_DEFAULT".to_string(), "1".to_string());
    env.insert(
        "PERL_AUTOINSTALL".to_string(),
        "--defaultdeps".to_string(),
    );
    Ok(env)
}

fn prepend(dir: &Path, existing: Option<OsString>) -> Result<String> {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = existing {
        paths.extend(std::env::split_paths(&existing));
    }
    let joined = std::env::join_paths(paths).map_err(|e| RevdepError::ConfigValidationError {
        message: format!("installation root {} cannot go on a search path: {}", dir.display(), e),
    })?;
    Ok(joined.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn temporary_root_is_removed_on_drop() {
        let root = InstallRoot::create(None, false).unwrap();
        let path = root.path().to_path_buf();
        assert!(path.is_dir());

        drop(root);
        assert!(!path.exists());
    }

    #[test]
    fn kept_root_survives_drop() {
        let root = InstallRoot::create(None, true).unwrap();
        let path = root.path().to_path_buf();
        assert!(root.is_kept());

        drop(root);
        assert!(path.is_dir());
        fs::remove_dir_all(path).unwrap();
    }

    #[test]
    fn existing_directory_is_never_removed() {
        let temp = TempDir::new().unwrap();
        let root = InstallRoot::create(Some(temp.path()), false).unwrap();
        assert!(root.is_kept());

        drop(root);
        assert!(temp.path().is_dir());
    }

    #[test]
    fn created_explicit_directory_is_removed() {
        let temp = TempDir::new().unwrap();
        let location = temp.path().join("root");
        let root = InstallRoot::create(Some(&location), false).unwrap();
        assert!(location.is_dir());

        drop(root);
        assert!(!location.exists());
    }

    #[cfg(unix)]
    #[test]
    fn install_env_points_tools_at_root() {
        let env = install_env(Path::new("/tmp/root"), |key| match key {
            "PATH" => Some(OsString::from("/usr/bin:/bin")),
            _ => None,
        })
        .unwrap();

        assert_eq!(env["PERL_MM_OPT"], "INSTALL_BASE=/tmp/root");
        assert_eq!(env["PERL_MB_OPT"], "--install_base /tmp/root");
        assert_eq!(env["PERL5LIB"], "/tmp/root/lib/perl5");
        assert_eq!(env["PATH"], "/tmp/root/bin:/usr/bin:/bin");
    }

    #[cfg(unix)]
    #[test]
    fn install_env_keeps_inherited_perl5lib_after_root() {
        let env = install_env(Path::new("/r"), |key| match key {
            "PERL5LIB" => Some(OsString::from("/opt/lib")),
            _ => None,
        })
        .unwrap();

        assert_eq!(env["PERL5LIB"], "/r/lib/perl5:/opt/lib");
    }

    #[test]
    fn creating_a_root_does_not_touch_process_env() {
        let before = std::env::var_os("PERL_MM_OPT");
        let _root = InstallRoot::create(None, false).unwrap();
        assert_eq!(std::env::var_os("PERL_MM_OPT"), before);
    }
}
