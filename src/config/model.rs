// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::engine::SchedulerOptions;

/// Job file exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [scheduler]
/// workers = 4
///
/// [job.fetch]
/// cmd = "git fetch"
///
/// [job.build]
/// cmd = "cargo build"
/// after = ["fetch"]
/// ```
///
/// All sections are optional at the TOML level; validation requires at least
/// one job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    /// All jobs from `[job.<name>]`, keyed by job name.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulerSection {
    /// Worker threads to use. Defaults to the available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Shell command to execute.
    pub cmd: String,

    /// Jobs that must finish successfully before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    /// Free-form description, shown by `--dry-run`.
    #[serde(default)]
    pub description: Option<String>,
}

impl JobConfig {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            after: Vec::new(),
            description: None,
        }
    }
}

/// A validated job file.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (see
/// `validate.rs`), so holding one means: at least one job, every `after`
/// reference resolves, and the dependency graph is acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    pub job: BTreeMap<String, JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerSection,
        job: BTreeMap<String, JobConfig>,
    ) -> Self {
        Self { scheduler, job }
    }

    /// Scheduler options derived from `[scheduler]`.
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            workers: self.scheduler.workers,
            ..SchedulerOptions::default()
        }
    }
}
