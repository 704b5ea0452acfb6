// src/exec/job_runner.rs

//! Runs a single job at the worker boundary.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::dag::Job;
use crate::engine::latch::JobFailure;

/// Execute `job`, converting both returned errors and panics into a
/// [`JobFailure`]. Never unwinds into the caller.
pub fn run_job(job: &Job, worker: usize) -> Result<Duration, JobFailure> {
    debug!(job = %job.id(), worker, "starting job");
    let started = Instant::now();

    // A panicking job cannot leave scheduler state inconsistent: no scheduler
    // lock is held while it runs, and none of its dependents can start.
    let result = panic::catch_unwind(AssertUnwindSafe(|| job.run()));
    let elapsed = started.elapsed();

    match result {
        Ok(Ok(())) => {
            info!(
                job = %job.id(),
                worker,
                elapsed_ms = elapsed.as_millis() as u64,
                "job finished"
            );
            Ok(elapsed)
        }
        Ok(Err(error)) => {
            warn!(job = %job.id(), worker, error = %format!("{error:#}"), "job returned an error");
            Err(JobFailure::new(job.id().clone(), error))
        }
        Err(payload) => {
            let message = panic_message(payload);
            warn!(job = %job.id(), worker, panic = %message, "job panicked");
            Err(JobFailure::from_panic(job.id().clone(), message))
        }
    }
}

/// Best-effort extraction of a panic payload's message.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
