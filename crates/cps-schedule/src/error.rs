use cps_core::{AgentId, CpsError, Tick};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{agent} asked to wait a non-positive duration at {at}")]
    NonPositiveDuration { agent: AgentId, at: Tick },

    #[error("{agent} asked to wake at {requested}, before the current time {now}")]
    InPast { agent: AgentId, requested: Tick, now: Tick },

    /// `at + ticks` does not fit in a tick.
    #[error("{agent} asked to wait {ticks} ticks at {at}, past the end of time")]
    Overflow { agent: AgentId, at: Tick, ticks: u64 },

    #[error("roster parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CpsError),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
