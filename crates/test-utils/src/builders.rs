#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::thread;
use std::time::Duration;

use rundag::config::{ConfigFile, JobConfig, RawConfigFile, SchedulerSection};
use rundag::{Edge, Job, JobId};

use crate::recording::{Event, ExecutionLog};

/// What a recorded job does when it runs.
#[derive(Debug, Clone)]
enum Behaviour {
    Succeed,
    Fail(String),
    Panic(String),
}

/// Builder for a job set whose jobs record into a shared [`ExecutionLog`].
pub struct JobSetBuilder {
    log: ExecutionLog,
    order: Vec<JobId>,
    behaviour: BTreeMap<JobId, Behaviour>,
    delays: BTreeMap<JobId, Duration>,
    waits_for: BTreeMap<JobId, JobId>,
    edges: Vec<Edge>,
}

impl JobSetBuilder {
    pub fn new() -> Self {
        Self {
            log: ExecutionLog::new(),
            order: Vec::new(),
            behaviour: BTreeMap::new(),
            delays: BTreeMap::new(),
            waits_for: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn log(&self) -> ExecutionLog {
        self.log.clone()
    }

    fn with(mut self, id: impl Into<JobId>, behaviour: Behaviour) -> Self {
        let id = id.into();
        if !self.behaviour.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.behaviour.insert(id, behaviour);
        self
    }

    pub fn job(self, id: impl Into<JobId>) -> Self {
        self.with(id, Behaviour::Succeed)
    }

    pub fn jobs<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<JobId>,
    {
        for id in ids {
            self = self.job(id);
        }
        self
    }

    pub fn failing_job(self, id: impl Into<JobId>, message: &str) -> Self {
        self.with(id, Behaviour::Fail(message.to_string()))
    }

    pub fn panicking_job(self, id: impl Into<JobId>, message: &str) -> Self {
        self.with(id, Behaviour::Panic(message.to_string()))
    }

    /// Make `id` sleep for `delay` before finishing.
    pub fn delay(mut self, id: impl Into<JobId>, delay: Duration) -> Self {
        self.delays.insert(id.into(), delay);
        self
    }

    /// Make `id` block (up to 5 seconds) until `other` has started.
    pub fn wait_for_start_of(mut self, id: impl Into<JobId>, other: impl Into<JobId>) -> Self {
        self.waits_for.insert(id.into(), other.into());
        self
    }

    pub fn edge(mut self, from: impl Into<JobId>, to: impl Into<JobId>) -> Self {
        self.edges.push(Edge::new(from, to));
        self
    }

    pub fn edges<I, A, B>(mut self, edges: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<JobId>,
        B: Into<JobId>,
    {
        for (from, to) in edges {
            self = self.edge(from, to);
        }
        self
    }

    /// Build the jobs (in insertion order) and edges.
    pub fn build(self) -> (Vec<Job>, Vec<Edge>) {
        let jobs = self
            .order
            .iter()
            .map(|id| {
                let behaviour = self.behaviour[id].clone();
                let delay = self.delays.get(id).copied();
                let waits_for = self.waits_for.get(id).cloned();
                recorded_job(id.clone(), self.log.clone(), behaviour, delay, waits_for)
            })
            .collect();
        (jobs, self.edges)
    }
}

impl Default for JobSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn recorded_job(
    id: JobId,
    log: ExecutionLog,
    behaviour: Behaviour,
    delay: Option<Duration>,
    waits_for: Option<JobId>,
) -> Job {
    let job_id = id.clone();
    Job::new(id, move || {
        log.record(Event::Started(job_id.clone()));

        if let Some(ref other) = waits_for {
            for _ in 0..500 {
                if log.ran(other.as_str()) {
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        match &behaviour {
            Behaviour::Succeed => {
                log.record(Event::Finished(job_id.clone()));
                Ok(())
            }
            Behaviour::Fail(message) => {
                log.record(Event::Failed(job_id.clone()));
                Err(anyhow::anyhow!("{message}"))
            }
            Behaviour::Panic(message) => {
                log.record(Event::Failed(job_id.clone()));
                panic!("{message}")
            }
        }
    })
}

/// The diamond `1 -> {2, 3} -> 4`.
pub fn diamond() -> JobSetBuilder {
    JobSetBuilder::new()
        .jobs([1u32, 2, 3, 4])
        .edges([(1u32, 2u32), (1, 3), (2, 4), (3, 4)])
}

/// Builder for `ConfigFile` to simplify job-file test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                scheduler: SchedulerSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.scheduler.workers = Some(workers);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            job: JobConfig::new(cmd),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(dep.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.job.description = Some(text.to_string());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

/// Every job reachable from `root` by following `edges` forward.
pub fn reachable_from(root: &JobId, edges: &[Edge]) -> HashSet<JobId> {
    let mut seen = HashSet::new();
    let mut stack = vec![root.clone()];
    while let Some(current) = stack.pop() {
        for edge in edges.iter().filter(|e| e.from == current) {
            if seen.insert(edge.to.clone()) {
                stack.push(edge.to.clone());
            }
        }
    }
    seen
}
