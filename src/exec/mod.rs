// src/exec/mod.rs

//! Job execution layer.
//!
//! - [`worker_pool`] owns the worker threads and their loop.
//! - [`job_runner`] runs one job at the worker boundary, catching errors and
//!   panics.
//! - [`observer`] provides the [`RunObserver`] progress seam, a no-op default
//!   and the console reporter used by the CLI.
//! - [`command`] adapts shell commands from a job file into [`Job`](crate::dag::Job)s.

pub mod command;
pub mod job_runner;
pub mod observer;
pub mod worker_pool;

pub use command::{command_job, jobs_from_config};
pub use observer::{ConsoleReporter, NoopObserver, RunObserver};
