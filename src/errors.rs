// src/errors.rs

//! Crate-wide error type.
//!
//! Job failures are deliberately absent here: a failing job is an expected
//! outcome of a run and is reported through
//! [`RunOutcome::Failed`](crate::engine::RunOutcome::Failed), not as an error.

use thiserror::Error;

use crate::types::{JobId, SchedulerState};

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Duplicate job id: {0}")]
    DuplicateJob(JobId),

    #[error("Edge {from} -> {to} references unknown job '{missing}'")]
    UnknownJob {
        from: JobId,
        to: JobId,
        missing: JobId,
    },

    #[error("Job '{0}' cannot depend on itself")]
    SelfDependency(JobId),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Scheduler cannot run from state '{0}'")]
    NotIdle(SchedulerState),

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchedulerError {
    /// Whether the error was raised while validating jobs and edges, before
    /// any worker was started.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            SchedulerError::DuplicateJob(_)
                | SchedulerError::UnknownJob { .. }
                | SchedulerError::SelfDependency(_)
                | SchedulerError::DagCycle(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SchedulerError>;
