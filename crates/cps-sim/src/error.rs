use cps_agent::AgentError;
use cps_bus::BusError;
use cps_core::CpsError;
use cps_schedule::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("agent name {0:?} is used more than once")]
    DuplicateAgent(String),

    #[error("no agent named {0:?}")]
    UnknownAgent(String),

    /// Scheduler misuse.  Aborts the run.
    #[error("scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Core(#[from] CpsError),
}

pub type SimResult<T> = Result<T, SimError>;
