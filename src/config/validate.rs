// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::DagGraph;
use crate::errors::{Result, SchedulerError};
use crate::types::{Edge, JobId};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SchedulerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.scheduler, raw.job))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_scheduler_section(cfg)?;
    validate_job_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(SchedulerError::ConfigError(
            "job file must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scheduler.workers == Some(0) {
        return Err(SchedulerError::ConfigError(
            "[scheduler].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_job_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        if job.cmd.trim().is_empty() {
            return Err(SchedulerError::ConfigError(format!(
                "job '{name}' has an empty `cmd`"
            )));
        }
        for dep in job.after.iter() {
            if !cfg.job.contains_key(dep) {
                return Err(SchedulerError::ConfigError(format!(
                    "job '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
            if dep == name {
                return Err(SchedulerError::ConfigError(format!(
                    "job '{name}' cannot depend on itself in `after`"
                )));
            }
        }
    }
    Ok(())
}

/// Reuse the scheduler's own graph validation so the job file and the
/// library agree on what a valid DAG is.
fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let ids: Vec<JobId> = cfg.job.keys().map(JobId::from).collect();
    let edges: Vec<Edge> = cfg
        .job
        .iter()
        .flat_map(|(name, job)| job.after.iter().map(move |dep| Edge::new(dep, name)))
        .collect();

    DagGraph::build(&ids, &edges)?;
    Ok(())
}
