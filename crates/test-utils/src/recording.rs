//! Jobs that record when they ran, for ordering assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rundag::JobId;

/// One entry in an [`ExecutionLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(JobId),
    Finished(JobId),
    /// The job returned an error or panicked.
    Failed(JobId),
}

/// Shared, thread-safe timeline of job starts and finishes.
///
/// Every event gets a global sequence number from one counter, so
/// "u finished before v started" is a plain integer comparison.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    inner: Arc<LogInner>,
}

#[derive(Debug, Default)]
struct LogInner {
    seq: AtomicUsize,
    events: Mutex<Vec<(usize, Event)>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: Event) {
        // Take the sequence number under the lock so sequence order and
        // vector order agree.
        let mut events = self.inner.events.lock().unwrap();
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst);
        events.push((seq, event));
    }

    pub fn events(&self) -> Vec<(usize, Event)> {
        self.inner.events.lock().unwrap().clone()
    }

    /// How many times `job` started.
    pub fn start_count(&self, job: &str) -> usize {
        self.events()
            .iter()
            .filter(|(_, e)| matches!(e, Event::Started(id) if id.as_str() == job))
            .count()
    }

    /// Start counts for every job that started at least once.
    pub fn start_counts(&self) -> HashMap<JobId, usize> {
        let mut counts = HashMap::new();
        for (_, event) in self.events() {
            if let Event::Started(id) = event {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn ran(&self, job: &str) -> bool {
        self.start_count(job) > 0
    }

    pub fn started_at(&self, job: &str) -> Option<usize> {
        self.events().into_iter().find_map(|(seq, e)| match e {
            Event::Started(id) if id.as_str() == job => Some(seq),
            _ => None,
        })
    }

    pub fn finished_at(&self, job: &str) -> Option<usize> {
        self.events().into_iter().find_map(|(seq, e)| match e {
            Event::Finished(id) if id.as_str() == job => Some(seq),
            _ => None,
        })
    }

    pub fn failed_at(&self, job: &str) -> Option<usize> {
        self.events().into_iter().find_map(|(seq, e)| match e {
            Event::Failed(id) if id.as_str() == job => Some(seq),
            _ => None,
        })
    }

    /// Jobs whose start was recorded after sequence number `seq`.
    pub fn started_after(&self, seq: usize) -> Vec<JobId> {
        self.events()
            .into_iter()
            .filter_map(|(s, e)| match e {
                Event::Started(id) if s > seq => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Whether `before` finished before `after` started. Both must have run.
    pub fn finished_before_start(&self, before: &str, after: &str) -> bool {
        match (self.finished_at(before), self.started_at(after)) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }
}
