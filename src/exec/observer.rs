// src/exec/observer.rs

//! Progress callbacks.
//!
//! The scheduler reports job lifecycle events to a [`RunObserver`]. Callers
//! that want progress output (the CLI, tests that record timelines) plug in
//! their own implementation; the default is [`NoopObserver`].
//!
//! Observers are invoked from worker threads, outside every scheduler lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::engine::latch::JobFailure;
use crate::types::JobId;

pub trait RunObserver: Send + Sync {
    /// A worker is about to execute `job`.
    fn job_started(&self, _job: &JobId, _worker: usize) {}

    /// `job` returned successfully.
    fn job_succeeded(&self, _job: &JobId, _elapsed: Duration) {}

    /// `job` returned an error or panicked.
    fn job_failed(&self, _failure: &JobFailure) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Prints one line per finished job to stdout.
#[derive(Debug)]
pub struct ConsoleReporter {
    total: usize,
    finished: AtomicUsize,
}

impl ConsoleReporter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            finished: AtomicUsize::new(0),
        }
    }

    fn next_position(&self) -> usize {
        self.finished.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl RunObserver for ConsoleReporter {
    fn job_started(&self, job: &JobId, worker: usize) {
        println!("      start {job} (worker {worker})");
    }

    fn job_succeeded(&self, job: &JobId, elapsed: Duration) {
        let n = self.next_position();
        println!("[{n}/{}] ok    {job} ({} ms)", self.total, elapsed.as_millis());
    }

    fn job_failed(&self, failure: &JobFailure) {
        let n = self.next_position();
        println!("[{n}/{}] FAIL  {}: {:#}", self.total, failure.job, failure.error);
    }
}
