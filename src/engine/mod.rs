// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the ready queue workers pull job ids from ([`queue`])
//! - the completion tracker the orchestrator waits on ([`completion`])
//! - the first-error-wins failure latch ([`latch`])
//! - the orchestrator itself ([`runtime`]), which builds the graph, seeds the
//!   queue, runs the worker pool and reports a [`RunOutcome`].

use std::fmt;
use std::sync::Arc;

use crate::exec::observer::{NoopObserver, RunObserver};

pub mod completion;
pub mod latch;
pub mod outcome;
pub mod queue;
pub mod runtime;

pub use completion::CompletionTracker;
pub use latch::{FailureLatch, JobFailure, RunFailure};
pub use outcome::{FailureReport, RunOutcome, RunReport};
pub use queue::ReadyQueue;
pub use runtime::Scheduler;

/// Smallest worker pool the scheduler will run with.
pub const MIN_WORKERS: usize = 2;

/// Options for a [`Scheduler`].
#[derive(Clone)]
pub struct SchedulerOptions {
    /// Requested worker count. `None` uses the available hardware
    /// parallelism. Either way the pool never has fewer than
    /// [`MIN_WORKERS`] threads.
    pub workers: Option<usize>,
    /// Receives job lifecycle events from the workers.
    pub observer: Arc<dyn RunObserver>,
}

impl SchedulerOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Number of worker threads a run will actually use.
    pub fn effective_workers(&self) -> usize {
        let requested = self.workers.unwrap_or_else(default_workers);
        requested.max(MIN_WORKERS)
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            workers: None,
            observer: Arc::new(NoopObserver),
        }
    }
}

impl fmt::Debug for SchedulerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerOptions")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
}
