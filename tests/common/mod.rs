#![allow(dead_code)]

pub use rundag_test_utils::{init_tracing, with_timeout};

use rundag::{Edge, Job, RunOutcome, Scheduler, SchedulerOptions};

/// Build a scheduler with `workers` threads and run it under a timeout.
pub fn run_jobs(jobs: Vec<Job>, edges: Vec<Edge>, workers: usize) -> RunOutcome {
    with_timeout(move || {
        let options = SchedulerOptions::default().with_workers(workers);
        let mut scheduler = Scheduler::new(jobs, edges, options).expect("valid job graph");
        scheduler.run().expect("no internal scheduler error")
    })
}
