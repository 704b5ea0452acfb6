// tests/integration/command_jobs.rs

#![cfg(unix)]

use std::fs;
use std::path::Path;

use rundag::cli::CliArgs;
use rundag::exec::jobs_from_config;
use rundag::{RunOutcome, Scheduler};
use rundag_test_utils::builders::{ConfigFileBuilder, JobConfigBuilder};
use rundag_test_utils::{init_tracing, with_timeout};
use tempfile::tempdir;

fn append(out: &Path, word: &str) -> String {
    format!("echo {word} >> '{}'", out.display())
}

fn lines(out: &Path) -> Vec<String> {
    fs::read_to_string(out)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn args_for(path: &Path, dry_run: bool) -> CliArgs {
    CliArgs {
        config: path.to_path_buf(),
        workers: Some(2),
        log_level: None,
        dry_run,
    }
}

#[test]
fn command_chain_runs_in_order() {
    init_tracing();

    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");

    let cfg = ConfigFileBuilder::new()
        .with_workers(4)
        .with_job("fetch", JobConfigBuilder::new(&append(&out, "fetch")).build())
        .with_job(
            "build",
            JobConfigBuilder::new(&append(&out, "build"))
                .after("fetch")
                .build(),
        )
        .with_job(
            "package",
            JobConfigBuilder::new(&append(&out, "package"))
                .after("build")
                .build(),
        )
        .build();

    let (jobs, edges) = jobs_from_config(&cfg);
    let outcome = with_timeout(move || {
        let mut scheduler = Scheduler::new(jobs, edges, cfg.scheduler_options()).unwrap();
        scheduler.run().unwrap()
    });

    assert!(outcome.is_success());
    assert_eq!(lines(&out), ["fetch", "build", "package"]);
}

#[test]
fn failing_command_stops_dependents() {
    init_tracing();

    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");

    let cfg = ConfigFileBuilder::new()
        .with_job(
            "lint",
            JobConfigBuilder::new("echo 'style violation' >&2; exit 3").build(),
        )
        .with_job(
            "release",
            JobConfigBuilder::new(&append(&out, "release"))
                .after("lint")
                .build(),
        )
        .build();

    let (jobs, edges) = jobs_from_config(&cfg);
    let outcome = with_timeout(move || {
        let mut scheduler = Scheduler::new(jobs, edges, cfg.scheduler_options()).unwrap();
        scheduler.run().unwrap()
    });

    let RunOutcome::Failed(report) = outcome else {
        panic!("expected the run to fail");
    };
    assert_eq!(report.job.as_str(), "lint");
    let msg = report.error.to_string();
    assert!(msg.contains("code 3"), "{msg}");
    assert!(msg.contains("style violation"), "{msg}");
    assert!(lines(&out).is_empty());
}

#[test]
fn run_entry_point_executes_job_file() {
    init_tracing();

    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let job_file = dir.path().join("Rundag.toml");
    fs::write(
        &job_file,
        format!(
            r#"
[job.one]
cmd = "{}"

[job.two]
cmd = "{}"
after = ["one"]
"#,
            append(&out, "one"),
            append(&out, "two")
        ),
    )
    .unwrap();

    with_timeout(move || rundag::run(args_for(&job_file, false))).unwrap();

    assert_eq!(lines(&out), ["one", "two"]);
}

#[test]
fn run_entry_point_reports_failure() {
    let dir = tempdir().unwrap();
    let job_file = dir.path().join("Rundag.toml");
    fs::write(&job_file, "[job.broken]\ncmd = \"exit 1\"\n").unwrap();

    let err = with_timeout(move || rundag::run(args_for(&job_file, false))).unwrap_err();

    assert!(err.to_string().contains("broken"), "{err:#}");
}

#[test]
fn dry_run_executes_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let job_file = dir.path().join("Rundag.toml");
    fs::write(
        &job_file,
        format!("[job.only]\ncmd = \"{}\"\n", append(&out, "only")),
    )
    .unwrap();

    rundag::run(args_for(&job_file, true)).unwrap();

    assert!(!out.exists());
}
