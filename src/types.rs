use std::borrow::Borrow;
use std::fmt;

/// Identity of a job inside one scheduler.
///
/// Backed by a string so both named jobs (`"build"`) and numbered jobs
/// (`1`, `2`, ...) map onto the same key type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for JobId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&JobId> for JobId {
    fn from(id: &JobId) -> Self {
        id.clone()
    }
}

macro_rules! job_id_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for JobId {
                fn from(id: $ty) -> Self {
                    Self(id.to_string())
                }
            }
        )*
    };
}

job_id_from_int!(i32, i64, u32, u64, usize);

/// Precedence constraint: `to` must not start before `from` finished
/// successfully.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: JobId,
    pub to: JobId,
}

impl Edge {
    pub fn new(from: impl Into<JobId>, to: impl Into<JobId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl<A, B> From<(A, B)> for Edge
where
    A: Into<JobId>,
    B: Into<JobId>,
{
    fn from((from, to): (A, B)) -> Self {
        Edge::new(from, to)
    }
}

/// Lifecycle of a [`Scheduler`](crate::engine::Scheduler).
///
/// `Idle -> Running -> {Succeeded, Failed}`; the terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Succeeded => "succeeded",
            SchedulerState::Failed => "failed",
        };
        f.write_str(s)
    }
}
