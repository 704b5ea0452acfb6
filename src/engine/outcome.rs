// src/engine/outcome.rs

//! Terminal results of a scheduler run.

use std::time::Duration;

use crate::types::JobId;

/// Summary of a run in which every job succeeded.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Jobs in the order they finished.
    pub completed: Vec<JobId>,
    /// Worker threads used for the run.
    pub workers: usize,
    /// Sum of outstanding dependency counters after the run (always 0 for a
    /// successful run; kept for diagnostics).
    pub remaining_dependencies: usize,
    /// Ids accepted by the ready queue over the run; equals the job count
    /// for a successful run.
    pub enqueued: usize,
    pub elapsed: Duration,
}

/// Summary of a run stopped by a job failure.
#[derive(Debug)]
pub struct FailureReport {
    /// The job whose failure was reported first.
    pub job: JobId,
    pub error: anyhow::Error,
    /// Whether that job panicked instead of returning an error.
    pub panicked: bool,
    /// Jobs that finished successfully, in completion order. Includes work
    /// that was already in flight when the failure happened.
    pub completed: Vec<JobId>,
    /// Jobs that were never started, in the order they were supplied.
    pub never_ran: Vec<JobId>,
    /// Transitive dependents of the failing job. None of them ran.
    pub blocked: Vec<JobId>,
    pub workers: usize,
    pub elapsed: Duration,
}

/// Result of [`Scheduler::run`](crate::engine::Scheduler::run).
#[derive(Debug)]
pub enum RunOutcome {
    Succeeded(RunReport),
    Failed(FailureReport),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }

    /// Jobs that finished successfully, in completion order.
    pub fn completed(&self) -> &[JobId] {
        match self {
            RunOutcome::Succeeded(report) => &report.completed,
            RunOutcome::Failed(report) => &report.completed,
        }
    }

    pub fn failure(&self) -> Option<&FailureReport> {
        match self {
            RunOutcome::Succeeded(_) => None,
            RunOutcome::Failed(report) => Some(report),
        }
    }

    /// Convert into a `Result`, turning a failed run into an error that names
    /// the originating job.
    pub fn into_result(self) -> anyhow::Result<RunReport> {
        match self {
            RunOutcome::Succeeded(report) => Ok(report),
            RunOutcome::Failed(report) => {
                Err(report.error.context(format!("job '{}' failed", report.job)))
            }
        }
    }
}
