// tests/integration/error_handling.rs

use std::fs;

use rundag::config::load_and_validate;
use rundag::errors::SchedulerError;
use tempfile::tempdir;

fn write_job_file(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Rundag.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn cyclic_job_file_is_rejected() {
    let (_dir, path) = write_job_file(
        r#"
[job.a]
cmd = "true"
after = ["c"]

[job.b]
cmd = "true"
after = ["a"]

[job.c]
cmd = "true"
after = ["b"]
"#,
    );

    let res = load_and_validate(&path);
    assert!(matches!(res, Err(SchedulerError::DagCycle(_))), "got {res:?}");
}

#[test]
fn unknown_after_entry_is_a_config_error() {
    let (_dir, path) = write_job_file(
        r#"
[job.deploy]
cmd = "true"
after = ["build"]
"#,
    );

    match load_and_validate(&path) {
        Err(SchedulerError::ConfigError(msg)) => {
            assert!(msg.contains("deploy"), "{msg}");
            assert!(msg.contains("build"), "{msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn empty_job_file_is_a_config_error() {
    let (_dir, path) = write_job_file("[scheduler]\nworkers = 4\n");

    let res = load_and_validate(&path);
    assert!(matches!(res, Err(SchedulerError::ConfigError(_))), "got {res:?}");
}

#[test]
fn malformed_toml_is_reported() {
    let (_dir, path) = write_job_file("[job.a\ncmd = ");

    let res = load_and_validate(&path);
    assert!(matches!(res, Err(SchedulerError::TomlError(_))), "got {res:?}");
}

#[test]
fn missing_job_file_is_an_io_error() {
    let dir = tempdir().unwrap();

    let res = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(res, Err(SchedulerError::IoError(_))), "got {res:?}");
}

#[test]
fn valid_job_file_loads() {
    let (_dir, path) = write_job_file(
        r#"
[scheduler]
workers = 3

[job.build]
cmd = "make"
description = "compile everything"

[job.test]
cmd = "make test"
after = ["build"]
"#,
    );

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.scheduler.workers, Some(3));
    assert_eq!(cfg.job.len(), 2);
    assert_eq!(cfg.job["test"].after, vec!["build".to_string()]);
    assert_eq!(
        cfg.job["build"].description.as_deref(),
        Some("compile everything")
    );
    assert_eq!(cfg.scheduler_options().effective_workers(), 3);
}
