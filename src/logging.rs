// src/logging.rs

//! Stderr logging for the `rundag` binary.
//!
//! Each line carries the emitting thread's name, so events from the
//! `rundag-worker-N` threads stay attributable when jobs interleave. Stdout is
//! left to job output and the progress report.
//!
//! The filter is taken from, in order:
//! 1. `--log-level`;
//! 2. `RUNDAG_LOG`, either a plain level (`debug`) or full `EnvFilter`
//!    directives (`rundag::exec=trace,info`);
//! 3. `info`.

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "RUNDAG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logging subscriber: {e}"))?;

    if let Some(bad) = rejected {
        warn!(value = %bad, "ignoring unparsable {LOG_ENV}; using {DEFAULT_DIRECTIVE}");
    }
    Ok(())
}

/// Resolve the filter. The second element is an env value that was
/// rejected, reported once the subscriber is up.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(directive_for(level)), None);
    }

    let Some(raw) = env.map(str::trim).filter(|s| !s.is_empty()) else {
        return (EnvFilter::new(DEFAULT_DIRECTIVE), None);
    };

    let directives = if raw.eq_ignore_ascii_case("warning") {
        "warn".to_string()
    } else {
        raw.to_lowercase()
    };
    match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVE), Some(raw.to_string())),
    }
}

fn directive_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
