// tests/property/scheduler.rs

use std::collections::BTreeSet;

use proptest::prelude::*;
use rundag::{JobId, RunOutcome, Scheduler, SchedulerOptions};
use rundag_test_utils::builders::{reachable_from, JobSetBuilder};
use rundag_test_utils::with_timeout;

/// Random DAG over jobs `0..n`: job `i` may only depend on jobs `< i`, so
/// every generated graph is acyclic.
fn dag_strategy(max_jobs: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1..=max_jobs).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..n.min(4)), n)
            .prop_map(move |raw| {
                let mut edges = BTreeSet::new();
                for (i, deps) in raw.into_iter().enumerate().skip(1) {
                    for d in deps {
                        edges.insert((d % i, i));
                    }
                }
                (n, edges.into_iter().collect())
            })
    })
}

fn name(i: usize) -> String {
    i.to_string()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_job_runs_once_after_its_dependencies(
        (n, edges) in dag_strategy(12),
        workers in 1usize..6,
    ) {
        let builder = JobSetBuilder::new().jobs(0..n).edges(edges.clone());
        let log = builder.log();
        let (jobs, job_edges) = builder.build();

        let outcome = with_timeout(move || {
            let options = SchedulerOptions::default().with_workers(workers);
            Scheduler::new(jobs, job_edges, options).unwrap().run().unwrap()
        });

        prop_assert!(outcome.is_success());
        let RunOutcome::Succeeded(report) = outcome else { unreachable!() };

        for i in 0..n {
            prop_assert_eq!(log.start_count(&name(i)), 1, "job {} start count", i);
        }
        for (from, to) in &edges {
            prop_assert!(
                log.finished_before_start(&name(*from), &name(*to)),
                "job {} started before {} finished", to, from
            );
        }
        prop_assert_eq!(report.completed.len(), n);
        prop_assert_eq!(report.remaining_dependencies, 0);
        prop_assert_eq!(report.enqueued, n);
    }

    #[test]
    fn failure_blocks_every_transitive_dependent(
        (n, edges) in dag_strategy(12),
        fail_seed in any::<usize>(),
        workers in 1usize..6,
    ) {
        let failing = fail_seed % n;
        let mut builder = JobSetBuilder::new();
        for i in 0..n {
            builder = if i == failing {
                builder.failing_job(i, &format!("job {i} broke"))
            } else {
                builder.job(i)
            };
        }
        let builder = builder.edges(edges);
        let log = builder.log();
        let (jobs, job_edges) = builder.build();
        let all_edges = job_edges.clone();

        let outcome = with_timeout(move || {
            let options = SchedulerOptions::default().with_workers(workers);
            Scheduler::new(jobs, job_edges, options).unwrap().run().unwrap()
        });

        // Every prerequisite of the failing job succeeds, so it always runs.
        let failure = outcome.failure();
        prop_assert!(failure.is_some());
        let failure = failure.unwrap();
        prop_assert_eq!(&failure.job, &JobId::from(failing));
        let expected = format!("job {} broke", failing);
        let message = failure.error.to_string();
        prop_assert!(message.contains(&expected), "error '{}' lacks '{}'", message, expected);

        for downstream in reachable_from(&JobId::from(failing), &all_edges) {
            prop_assert!(!log.ran(downstream.as_str()), "{} ran after upstream failure", downstream);
            prop_assert!(failure.blocked.contains(&downstream));
            prop_assert!(failure.never_ran.contains(&downstream));
        }
        for (job, count) in log.start_counts() {
            prop_assert_eq!(count, 1, "job {} start count", job);
        }
    }
}
