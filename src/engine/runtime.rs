// src/engine/runtime.rs

//! The scheduler orchestrator.

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dag::{DagGraph, DependencyState, Job};
use crate::engine::completion::CompletionTracker;
use crate::engine::latch::{FailureLatch, RunFailure};
use crate::engine::outcome::{FailureReport, RunOutcome, RunReport};
use crate::engine::queue::ReadyQueue;
use crate::engine::SchedulerOptions;
use crate::errors::{Result, SchedulerError};
use crate::exec::job_runner::panic_message;
use crate::exec::worker_pool::{spawn_workers, WorkerContext};
use crate::types::{Edge, JobId, SchedulerState};

/// Runs a fixed set of jobs over a bounded pool of worker threads, honouring
/// every precedence edge.
///
/// Lifecycle: `Idle -> Running -> {Succeeded, Failed}`. A scheduler runs at
/// most once; construction validates the whole graph so that a malformed job
/// set never starts a thread.
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    jobs: HashMap<JobId, Job>,
    options: SchedulerOptions,
    state: SchedulerState,
}

impl Scheduler {
    /// Validate jobs and edges and build the dependency graph.
    pub fn new(jobs: Vec<Job>, edges: Vec<Edge>, options: SchedulerOptions) -> Result<Self> {
        let graph = DagGraph::build(jobs.iter().map(Job::id), &edges)?;
        let jobs: HashMap<JobId, Job> = jobs
            .into_iter()
            .map(|job| (job.id().clone(), job))
            .collect();

        info!(
            jobs = graph.len(),
            edges = graph.edge_count(),
            workers = options.effective_workers(),
            "scheduler constructed"
        );

        Ok(Self {
            graph,
            jobs,
            options,
            state: SchedulerState::Idle,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    /// Number of worker threads a run will use.
    pub fn worker_count(&self) -> usize {
        self.options.effective_workers()
    }

    /// Run every job to completion, or until the first failure.
    ///
    /// Blocks the calling thread. All workers have been joined by the time
    /// this returns.
    ///
    /// Returns:
    /// - `Ok(RunOutcome::Succeeded)` when every job ran successfully;
    /// - `Ok(RunOutcome::Failed)` carrying the first job failure;
    /// - `Err` for scheduler-internal problems (invariant violations, worker
    ///   threads that could not be spawned), or when called twice.
    pub fn run(&mut self) -> Result<RunOutcome> {
        if self.state != SchedulerState::Idle {
            return Err(SchedulerError::NotIdle(self.state));
        }

        self.state = SchedulerState::Running;
        let result = self.execute();

        self.state = match &result {
            Ok(RunOutcome::Succeeded(_)) => SchedulerState::Succeeded,
            Ok(RunOutcome::Failed(_)) | Err(_) => SchedulerState::Failed,
        };
        info!(state = %self.state, "scheduler run finished");

        result
    }

    fn execute(&self) -> Result<RunOutcome> {
        let started_at = Instant::now();
        let total = self.graph.len();
        let workers = self.worker_count();

        if total == 0 {
            info!("no jobs to run");
            return Ok(RunOutcome::Succeeded(RunReport {
                completed: Vec::new(),
                workers: 0,
                remaining_dependencies: 0,
                enqueued: 0,
                elapsed: started_at.elapsed(),
            }));
        }

        let queue = ReadyQueue::new();
        let deps = DependencyState::new(&self.graph);
        let tracker = CompletionTracker::new(total);
        let latch = FailureLatch::new();

        let roots = self.graph.roots();
        if roots.is_empty() {
            // Unreachable for a validated graph; guards against a silent hang.
            return Err(SchedulerError::InvariantViolation(
                "no job is initially ready".to_string(),
            ));
        }
        info!(total, workers, roots = ?roots, "starting scheduler run");
        for root in roots {
            queue.push(root);
        }

        let ctx = WorkerContext::new(
            &self.jobs,
            &deps,
            &queue,
            &tracker,
            &latch,
            self.options.observer.as_ref(),
        );

        let join_errors: Vec<String> = thread::scope(|scope| {
            let handles = spawn_workers(scope, &ctx, workers);

            let finished = tracker.wait_until_settled(|| latch.is_stopped());
            debug!(
                finished,
                total,
                stopped = latch.is_stopped(),
                "orchestrator woke; shutting down workers"
            );
            queue.mark_finished();

            handles
                .into_iter()
                .filter_map(|handle| handle.join().err().map(panic_message))
                .collect()
        });

        if let Some(message) = join_errors.into_iter().next() {
            return Err(SchedulerError::WorkerPanicked(message));
        }

        let completed = ctx.completed();
        let elapsed = started_at.elapsed();

        match latch.take() {
            None => {
                if !tracker.is_complete() {
                    let finished = tracker.finished();
                    return Err(SchedulerError::InvariantViolation(format!(
                        "run ended with {finished} of {total} jobs finished and no failure"
                    )));
                }
                let remaining_dependencies = deps.remaining_total();
                if remaining_dependencies != 0 {
                    warn!(remaining_dependencies, "dependency counters not drained");
                }
                Ok(RunOutcome::Succeeded(RunReport {
                    completed,
                    workers,
                    remaining_dependencies,
                    enqueued: queue.pushed_total(),
                    elapsed,
                }))
            }
            Some(RunFailure::Job(failure)) => {
                let started: HashSet<JobId> = ctx.started().into_iter().collect();
                let never_ran = self
                    .graph
                    .job_ids()
                    .iter()
                    .filter(|id| !started.contains(*id))
                    .cloned()
                    .collect();
                let blocked = self
                    .graph
                    .downstream_of(failure.job.as_str())
                    .into_iter()
                    .collect();

                Ok(RunOutcome::Failed(FailureReport {
                    job: failure.job,
                    error: failure.error,
                    panicked: failure.panicked,
                    completed,
                    never_ran,
                    blocked,
                    workers,
                    elapsed,
                }))
            }
            Some(RunFailure::Internal(e)) => Err(e),
        }
    }
}
