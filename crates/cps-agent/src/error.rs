//! Error types for `cps-agent`.

use cps_core::CpsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {name:?}: {reason}")]
    InvalidSpec { name: String, reason: String },

    #[error(transparent)]
    Core(#[from] CpsError),
}

pub type AgentResult<T> = Result<T, AgentError>;
