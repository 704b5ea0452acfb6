// src/exec/worker_pool.rs

//! Worker threads that drain the ready queue.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, Scope, ScopedJoinHandle};

use tracing::{debug, error, trace};

use crate::dag::{DependencyState, Job};
use crate::engine::completion::CompletionTracker;
use crate::engine::latch::{FailureLatch, RunFailure};
use crate::engine::queue::ReadyQueue;
use crate::errors::{Result, SchedulerError};
use crate::exec::job_runner::{panic_message, run_job};
use crate::exec::observer::RunObserver;
use crate::types::JobId;

/// Everything a worker shares with the other workers and the orchestrator
/// for the duration of one run.
pub struct WorkerContext<'a> {
    pub jobs: &'a HashMap<JobId, Job>,
    pub deps: &'a DependencyState<'a>,
    pub queue: &'a ReadyQueue,
    pub tracker: &'a CompletionTracker,
    pub latch: &'a FailureLatch,
    pub observer: &'a dyn RunObserver,
    started: Mutex<Vec<JobId>>,
    completed: Mutex<Vec<JobId>>,
}

/// Why a worker's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The queue reported no more work.
    Drained,
    /// The stop flag was set when the worker picked up its next job.
    Stopped,
    /// This worker finished the last outstanding job.
    CompletedLast,
    /// This worker reported a failure.
    Failed,
}

impl<'a> WorkerContext<'a> {
    pub fn new(
        jobs: &'a HashMap<JobId, Job>,
        deps: &'a DependencyState<'a>,
        queue: &'a ReadyQueue,
        tracker: &'a CompletionTracker,
        latch: &'a FailureLatch,
        observer: &'a dyn RunObserver,
    ) -> Self {
        Self {
            jobs,
            deps,
            queue,
            tracker,
            latch,
            observer,
            started: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Report a failure; the first one stops the run.
    ///
    /// The winning report finishes the ready queue (so idle workers wake and
    /// exit) and wakes the orchestrator.
    pub fn fail(&self, failure: RunFailure) -> bool {
        let first = self.latch.report(failure);
        if first {
            self.queue.mark_finished();
            self.tracker.wake();
        }
        first
    }

    /// Jobs that were picked up and started, in start order.
    pub fn started(&self) -> Vec<JobId> {
        lock(&self.started).clone()
    }

    /// Jobs that finished successfully, in completion order.
    pub fn completed(&self) -> Vec<JobId> {
        lock(&self.completed).clone()
    }

    /// Bookkeeping after `id` succeeded. Returns `true` if it was the last job.
    fn complete(&self, id: &JobId) -> Result<bool> {
        lock(&self.completed).push(id.clone());

        let finished = self.tracker.mark_done();
        let total = self.tracker.total();
        if finished > total {
            return Err(SchedulerError::InvariantViolation(format!(
                "{finished} jobs finished but only {total} exist"
            )));
        }
        if finished == total {
            return Ok(true);
        }

        for ready in self.deps.on_job_finished(id.as_str())? {
            if self.latch.is_stopped() {
                debug!(job = %ready, "stop flag set; not enqueueing dependent");
                continue;
            }
            self.queue.push(ready);
        }

        Ok(false)
    }
}

/// Main loop of one worker thread.
pub fn worker_loop(ctx: &WorkerContext<'_>, worker: usize) -> WorkerExit {
    debug!(worker, "worker started");

    let exit = loop {
        let Some(id) = ctx.queue.pop() else {
            break WorkerExit::Drained;
        };

        if ctx.latch.is_stopped() {
            debug!(worker, job = %id, "stop flag set; not starting job");
            break WorkerExit::Stopped;
        }

        let Some(job) = ctx.jobs.get(&id) else {
            ctx.fail(RunFailure::Internal(SchedulerError::InvariantViolation(format!(
                "job '{id}' was enqueued but is not in the job table"
            ))));
            break WorkerExit::Failed;
        };

        lock(&ctx.started).push(id.clone());
        ctx.observer.job_started(&id, worker);

        match run_job(job, worker) {
            Ok(elapsed) => {
                ctx.observer.job_succeeded(&id, elapsed);
                match ctx.complete(&id) {
                    Ok(true) => break WorkerExit::CompletedLast,
                    Ok(false) => {}
                    Err(e) => {
                        ctx.fail(RunFailure::Internal(e));
                        break WorkerExit::Failed;
                    }
                }
            }
            Err(failure) => {
                // Latch first: a misbehaving observer must not mask the job error.
                let notice = failure.detached();
                ctx.fail(RunFailure::Job(failure));
                ctx.observer.job_failed(&notice);
                break WorkerExit::Failed;
            }
        }
    };

    debug!(worker, exit = ?exit, "worker exiting");
    exit
}

/// Spawn `count` named worker threads inside `scope`.
///
/// If a thread cannot be spawned, the failure is reported through the latch
/// (which stops the workers already running) and the handles spawned so far
/// are returned so the caller can still join them.
pub fn spawn_workers<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    ctx: &'env WorkerContext<'env>,
    count: usize,
) -> Vec<ScopedJoinHandle<'scope, WorkerExit>> {
    let mut handles = Vec::with_capacity(count);

    for worker in 0..count {
        let spawned = thread::Builder::new()
            .name(format!("rundag-worker-{worker}"))
            .spawn_scoped(scope, move || run_guarded(ctx, worker));

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                error!(worker, error = %e, "failed to spawn worker thread");
                ctx.fail(RunFailure::Internal(SchedulerError::WorkerSpawn(e)));
                break;
            }
        }
    }

    trace!(spawned = handles.len(), requested = count, "worker pool started");
    handles
}

/// Run the worker loop, turning a panic in scheduler code (or an observer)
/// into an internal failure so the orchestrator is never left waiting.
fn run_guarded(ctx: &WorkerContext<'_>, worker: usize) -> WorkerExit {
    match panic::catch_unwind(AssertUnwindSafe(|| worker_loop(ctx, worker))) {
        Ok(exit) => exit,
        Err(payload) => {
            let message = panic_message(payload);
            error!(worker, panic = %message, "worker panicked outside job execution");
            ctx.fail(RunFailure::Internal(SchedulerError::WorkerPanicked(message)));
            WorkerExit::Failed
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
