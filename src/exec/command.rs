// src/exec/command.rs

//! Shell-command jobs, as declared in a job file.

use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::dag::Job;
use crate::types::{Edge, JobId};

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` through the shell and wait for it.
///
/// Stdout is inherited so job output reaches the terminal directly; stderr is
/// captured, logged at debug level, and its last non-empty line is attached
/// to the error when the command exits unsuccessfully.
pub fn run_command(job: &JobId, cmd: &str) -> Result<()> {
    info!(job = %job, cmd = %cmd, "starting job process");

    let mut child = shell_command(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning process for job '{job}'"))?;

    let mut last_stderr: Option<String> = None;
    if let Some(stderr) = child.stderr.take() {
        // Job output is arbitrary bytes; only the exit status decides success.
        for chunk in BufReader::new(stderr).split(b'\n') {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(job = %job, error = %e, "stopped reading job stderr");
                    break;
                }
            };
            let line = String::from_utf8_lossy(&bytes);
            let line = line.trim_end_matches('\r');
            debug!(job = %job, "stderr: {}", line);
            if !line.trim().is_empty() {
                last_stderr = Some(line.to_string());
            }
        }
    }

    let status = child
        .wait()
        .with_context(|| format!("waiting for process of job '{job}'"))?;
    let code = status.code().unwrap_or(-1);

    info!(
        job = %job,
        exit_code = code,
        success = status.success(),
        "job process exited"
    );

    if status.success() {
        return Ok(());
    }
    match last_stderr {
        Some(line) => bail!("command exited with code {code}: {line}"),
        None => bail!("command exited with code {code}"),
    }
}

/// A job that runs `cmd` through the shell.
pub fn command_job(id: impl Into<JobId>, cmd: impl Into<String>) -> Job {
    let id = id.into();
    let cmd = cmd.into();
    let job_id = id.clone();
    Job::new(id, move || run_command(&job_id, &cmd))
}

/// Turn a validated job file into jobs and precedence edges.
///
/// Each `after = ["x"]` entry of job `y` becomes the edge `x -> y`.
pub fn jobs_from_config(cfg: &ConfigFile) -> (Vec<Job>, Vec<Edge>) {
    let mut jobs = Vec::with_capacity(cfg.job.len());
    let mut edges = Vec::new();

    for (name, job) in cfg.job.iter() {
        jobs.push(command_job(name, job.cmd.clone()));
        for dep in &job.after {
            edges.push(Edge::new(dep, name));
        }
    }

    (jobs, edges)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn successful_command() {
        assert!(run_command(&JobId::from("t"), "true").is_ok());
    }

    #[test]
    fn exit_code_is_reported() {
        let err = run_command(&JobId::from("t"), "exit 3").unwrap_err();
        assert!(err.to_string().contains("code 3"), "{err}");
    }

    #[test]
    fn last_stderr_line_is_attached() {
        let err = run_command(&JobId::from("t"), "echo first >&2; echo 'it broke' >&2; exit 1")
            .unwrap_err();
        assert!(err.to_string().contains("it broke"), "{err}");
    }

    #[test]
    fn non_utf8_stderr_does_not_fail_a_successful_command() {
        let res = run_command(&JobId::from("t"), "printf 'ok\\377\\n' >&2; exit 0");
        assert!(res.is_ok(), "{res:?}");
    }

    #[test]
    fn non_utf8_stderr_is_decoded_lossily_on_failure() {
        let err = run_command(&JobId::from("t"), "printf 'bad \\377 byte\\n' >&2; exit 2")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("code 2"), "{msg}");
        assert!(msg.contains("bad \u{FFFD} byte"), "{msg}");
    }

    #[test]
    fn command_job_runs_through_job_interface() {
        let job = command_job("ok", "exit 0");
        assert_eq!(job.id().as_str(), "ok");
        assert!(job.run().is_ok());
    }
}
