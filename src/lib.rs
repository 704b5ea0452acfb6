// src/lib.rs

//! Dependency-graph job scheduler.
//!
//! Given a set of [`Job`]s and precedence [`Edge`]s, a [`Scheduler`] executes
//! every job exactly once on a bounded pool of OS worker threads, never
//! starting a job before all of its dependencies finished successfully. The
//! first job failure stops further scheduling and is reported, together with
//! the jobs that never ran, as [`RunOutcome::Failed`].
//!
//! ```no_run
//! use rundag::{Edge, Job, Scheduler, SchedulerOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let jobs = vec![
//!     Job::new("fetch", || Ok(())),
//!     Job::new("build", || Ok(())),
//! ];
//! let edges = vec![Edge::new("fetch", "build")];
//!
//! let mut scheduler = Scheduler::new(jobs, edges, SchedulerOptions::default())?;
//! let report = scheduler.run()?.into_result()?;
//! assert_eq!(report.completed.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile};
use crate::exec::{jobs_from_config, ConsoleReporter};

pub use crate::dag::{DagGraph, Job};
pub use crate::engine::{FailureReport, RunOutcome, RunReport, Scheduler, SchedulerOptions};
pub use crate::errors::SchedulerError;
pub use crate::types::{Edge, JobId, SchedulerState};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job-file loading and validation
/// - the scheduler and its worker pool
/// - the console progress reporter
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config;
    let cfg = load_and_validate(&config_path)?;
    info!(path = %config_path.display(), jobs = cfg.job.len(), "job file loaded");

    let (jobs, edges) = jobs_from_config(&cfg);

    let mut options = cfg
        .scheduler_options()
        .with_observer(ConsoleReporter::new(jobs.len()));
    if let Some(workers) = args.workers {
        options = options.with_workers(workers);
    }

    let mut scheduler = Scheduler::new(jobs, edges, options)?;

    if args.dry_run {
        print_dry_run(&cfg, &scheduler);
        return Ok(());
    }

    match scheduler.run()? {
        RunOutcome::Succeeded(report) => {
            println!(
                "rundag: {} jobs succeeded on {} workers in {} ms",
                report.completed.len(),
                report.workers,
                report.elapsed.as_millis()
            );
            Ok(())
        }
        RunOutcome::Failed(report) => {
            println!("rundag: job '{}' failed: {:#}", report.job, report.error);
            if !report.never_ran.is_empty() {
                let names: Vec<&str> = report.never_ran.iter().map(JobId::as_str).collect();
                println!("rundag: never ran: {}", names.join(", "));
            }
            bail!("run failed at job '{}'", report.job)
        }
    }
}

/// Dry-run output: jobs in one valid execution order, with their deps and
/// commands.
fn print_dry_run(cfg: &ConfigFile, scheduler: &Scheduler) {
    let graph = scheduler.graph();

    println!("rundag dry-run");
    println!("  workers = {}", scheduler.worker_count());
    println!();

    println!("jobs ({}), in execution order:", graph.len());
    for id in graph.topological_order() {
        println!("  - {id}");
        if let Some(job) = cfg.job.get(id.as_str()) {
            println!("      cmd: {}", job.cmd);
            if let Some(ref description) = job.description {
                println!("      description: {description}");
            }
        }
        let deps = graph.dependencies_of(id.as_str());
        if !deps.is_empty() {
            let names: Vec<&str> = deps.iter().map(JobId::as_str).collect();
            println!("      after: {}", names.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
}
