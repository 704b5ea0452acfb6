// src/dag/state_manager.rs

//! Per-run dependency counters shared by all workers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::dag::DagGraph;
use crate::errors::{Result, SchedulerError};
use crate::types::JobId;

/// Remaining-dependency counters for one run over a [`DagGraph`].
///
/// The whole map sits behind a single mutex so that finishing a job
/// (decrementing every direct dependent and collecting the ones that reach
/// zero) is one critical section. Two workers finishing sibling jobs that
/// share a dependent therefore cannot both see it reach zero, nor can both
/// miss it.
///
/// No job ever executes while the lock is held.
#[derive(Debug)]
pub struct DependencyState<'g> {
    graph: &'g DagGraph,
    remaining: Mutex<HashMap<JobId, usize>>,
}

impl<'g> DependencyState<'g> {
    /// Initialise the counters from the graph's indegrees.
    pub fn new(graph: &'g DagGraph) -> Self {
        let remaining = graph
            .job_ids()
            .iter()
            .map(|id| (id.clone(), graph.indegree_of(id.as_str())))
            .collect();

        Self {
            graph,
            remaining: Mutex::new(remaining),
        }
    }

    /// Record that `id` finished successfully.
    ///
    /// Returns the dependents whose last outstanding dependency was `id`, i.e.
    /// the jobs that just became ready. Each dependent is returned by exactly
    /// one call over the lifetime of the run.
    pub fn on_job_finished(&self, id: &str) -> Result<Vec<JobId>> {
        let mut remaining = self.lock();
        let mut ready = Vec::new();

        for dependent in self.graph.dependents_of(id) {
            let count = remaining.get_mut(dependent.as_str()).ok_or_else(|| {
                SchedulerError::InvariantViolation(format!(
                    "dependent '{dependent}' of '{id}' has no dependency counter"
                ))
            })?;

            if *count == 0 {
                return Err(SchedulerError::InvariantViolation(format!(
                    "dependency count of '{dependent}' would drop below zero when '{id}' finished"
                )));
            }

            *count -= 1;
            trace!(job = %id, dependent = %dependent, remaining = *count, "decremented dependency count");

            if *count == 0 {
                ready.push(dependent.clone());
            }
        }

        if !ready.is_empty() {
            debug!(job = %id, ready = ?ready, "dependents became ready");
        }

        Ok(ready)
    }

    /// Outstanding dependency count of a single job.
    pub fn pending_of(&self, id: &str) -> Option<usize> {
        self.lock().get(id).copied()
    }

    /// Sum of all outstanding dependency counts; zero once every job ran.
    pub fn remaining_total(&self) -> usize {
        self.lock().values().sum()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, usize>> {
        // Poisoning can only come from a panic inside this module's own
        // critical sections, which never run user code.
        self.remaining.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
