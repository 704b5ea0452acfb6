// src/engine/completion.rs

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Shared counter of finished jobs plus the wait point of the orchestrator.
///
/// The count and the orchestrator's wait predicate are guarded by the same
/// mutex, and every notification is issued while holding it, so the
/// orchestrator cannot miss the wakeup for "all done" (or for a stop signal
/// delivered through [`CompletionTracker::wake`]).
#[derive(Debug)]
pub struct CompletionTracker {
    total: usize,
    done: Mutex<usize>,
    settled: Condvar,
}

impl CompletionTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: Mutex::new(0),
            settled: Condvar::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Record one finished job and return the new count.
    ///
    /// When the count reaches `total` the orchestrator is woken.
    pub fn mark_done(&self) -> usize {
        let mut done = self.lock();
        *done += 1;
        let finished = *done;
        if finished == self.total {
            debug!(total = self.total, "all jobs finished");
            self.settled.notify_all();
        }
        finished
    }

    pub fn finished(&self) -> usize {
        *self.lock()
    }

    pub fn is_complete(&self) -> bool {
        self.finished() >= self.total
    }

    /// Wake the orchestrator so it re-evaluates its stop condition.
    pub fn wake(&self) {
        let _guard = self.lock();
        self.settled.notify_all();
    }

    /// Block until every job finished or `stopped` returns `true`.
    ///
    /// `stopped` is re-checked after every wakeup, spurious ones included.
    /// Returns the finished count observed when the wait ended.
    pub fn wait_until_settled(&self, stopped: impl Fn() -> bool) -> usize {
        let guard = self.lock();
        let done = self
            .settled
            .wait_while(guard, |done| *done < self.total && !stopped())
            .unwrap_or_else(PoisonError::into_inner);
        *done
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn counts_up_to_total() {
        let t = CompletionTracker::new(2);
        assert_eq!(t.mark_done(), 1);
        assert!(!t.is_complete());
        assert_eq!(t.mark_done(), 2);
        assert!(t.is_complete());
    }

    #[test]
    fn wait_returns_immediately_when_already_complete() {
        let t = CompletionTracker::new(1);
        t.mark_done();
        assert_eq!(t.wait_until_settled(|| false), 1);
    }

    #[test]
    fn waiter_is_woken_by_last_completion() {
        let t = CompletionTracker::new(3);

        thread::scope(|s| {
            let waiter = s.spawn(|| t.wait_until_settled(|| false));
            for _ in 0..3 {
                thread::sleep(Duration::from_millis(5));
                s.spawn(|| t.mark_done());
            }
            assert_eq!(waiter.join().unwrap(), 3);
        });
    }

    #[test]
    fn waiter_is_woken_by_stop_signal() {
        let t = CompletionTracker::new(10);
        let stopped = AtomicBool::new(false);

        thread::scope(|s| {
            let waiter = s.spawn(|| t.wait_until_settled(|| stopped.load(Ordering::Acquire)));
            thread::sleep(Duration::from_millis(10));
            t.mark_done();
            stopped.store(true, Ordering::Release);
            t.wake();
            assert_eq!(waiter.join().unwrap(), 1);
        });
    }
}
