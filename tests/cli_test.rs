//! Integration tests for the revdep binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FIXTURE: &str = r#"
dependents:
  Foo::Bar: [Good::Dist, Task::Foo, Bundle::Foo, Acme::Dist]
distributions:
  - name: Good::Dist
    base_id: Good-Dist-1.00
    author: AUTHORID
"#;

fn setup_fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.yml"), FIXTURE).unwrap();
    temp
}

fn revdep(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("revdep"));
    cmd.current_dir(temp.path());
    for var in [
        "REVDEP_WORKERS",
        "REVDEP_LOG_DIR",
        "REVDEP_VERBOSE",
        "REVDEP_EXCLUDE",
        "REVDEP_INCLUDE",
        "REVDEP_KEEP_INSTALL_ROOT",
        "REVDEP_INDEX_URL",
        "REVDEP_FIXTURE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    revdep(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reverse dependencies of a package"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    revdep(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    revdep(&temp).assert().failure();
    Ok(())
}

#[test]
fn list_prints_filtered_dependents() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_fixture();
    revdep(&temp)
        .args(["list", "Foo::Bar", "--fixture", "index.yml", "--exclude", "^Acme"])
        .assert()
        .success()
        .stdout("Good::Dist\n");
    Ok(())
}

#[test]
fn list_reads_fixture_from_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_fixture();
    fs::write(
        temp.path().join("revdep.yml"),
        "index:\n  fixture: index.yml\nexclude: \"^Good\"\n",
    )?;
    revdep(&temp)
        .args(["list", "Foo::Bar"])
        .assert()
        .success()
        .stdout("Acme::Dist\n");
    Ok(())
}

#[test]
fn list_honours_environment() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_fixture();
    revdep(&temp)
        .env("REVDEP_FIXTURE", "index.yml")
        .env("REVDEP_INCLUDE", "Acme")
        .args(["list", "Foo::Bar"])
        .assert()
        .success()
        .stdout("Acme::Dist\n");
    Ok(())
}

#[test]
fn run_reports_unknown_names_as_skips() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_fixture();
    revdep(&temp)
        .args([
            "-q",
            "run",
            "Missing::Dist",
            "--fixture",
            "index.yml",
            "--log-dir",
            "logs",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "1..1\nok 1 # skip UNKNOWN: Missing::Dist (",
        ));

    let logs: Vec<_> = fs::read_dir(temp.path().join("logs"))?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|name| name.starts_with("Missing-Dist-")));
    Ok(())
}

#[test]
fn zero_workers_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_fixture();
    revdep(&temp)
        .args(["run", "Good::Dist", "--fixture", "index.yml", "-j", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("workers must be at least 1"));
    Ok(())
}

#[test]
fn missing_config_file_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_fixture();
    revdep(&temp)
        .args(["--config", "nope.yml", "list", "Foo::Bar"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration not found"));
    Ok(())
}

#[test]
fn invalid_pattern_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_fixture();
    revdep(&temp)
        .args(["list", "Foo::Bar", "--fixture", "index.yml", "--exclude", "("])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn completions_generate_script() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    revdep(&temp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("revdep"));
    Ok(())
}
