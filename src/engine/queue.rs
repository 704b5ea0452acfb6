// src/engine/queue.rs

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::types::JobId;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<JobId>,
    finished: bool,
    /// Accepted pushes over the queue's lifetime.
    pushed: usize,
}

/// Blocking multi-producer/multi-consumer queue of ready job ids.
///
/// Semantics:
/// - `push` appends to the back; once the queue is finished, pushes are
///   silently dropped (and reported as `false`).
/// - `pop` blocks until an id is available or the queue is finished with no
///   backlog left, in which case it returns `None`.
/// - `mark_finished` is idempotent and wakes every blocked consumer.
///
/// Order is FIFO. Correctness of the scheduler does not depend on it, but
/// it keeps single-worker runs deterministic.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a job id. Returns `false` if the queue was already finished.
    pub fn push(&self, id: JobId) -> bool {
        {
            let mut state = self.lock();
            if state.finished {
                debug!(job = %id, "ready queue finished; dropping push");
                return false;
            }
            trace!(job = %id, backlog = state.items.len(), "job enqueued");
            state.items.push_back(id);
            state.pushed += 1;
        }
        self.available.notify_one();
        true
    }

    /// Block until a job id is available or no more will ever arrive.
    pub fn pop(&self) -> Option<JobId> {
        let guard = self.lock();
        let mut state = self
            .available
            .wait_while(guard, |s| s.items.is_empty() && !s.finished)
            .unwrap_or_else(PoisonError::into_inner);
        state.items.pop_front()
    }

    /// Signal that no more items will arrive.
    ///
    /// Returns `true` for the call that actually transitioned the queue.
    pub fn mark_finished(&self) -> bool {
        let transitioned = {
            let mut state = self.lock();
            let was_finished = state.finished;
            state.finished = true;
            !was_finished
        };
        if transitioned {
            debug!("ready queue marked finished");
        }
        self.available.notify_all();
        transitioned
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// Number of ids currently waiting.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of accepted pushes so far.
    pub fn pushed_total(&self) -> usize {
        self.lock().pushed
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
