//! Error types for `cps-reply`.

use std::time::Duration;

use cps_core::{AgentId, CpsError, StepKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplyError {
    /// The deadline of a pending completion passed before it was cleared.
    #[error("{agent} gave up waiting for {step} after {waited:?}")]
    StepTimedOut {
        agent:  AgentId,
        step:   StepKind,
        waited: Duration,
    },

    #[error("completion notice: {0}")]
    Notice(#[from] NoticeError),

    #[error(transparent)]
    Core(#[from] CpsError),
}

/// Why a payload could not be read as a completion notice.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoticeError {
    #[error("payload does not contain the result marker")]
    MissingMarker,

    #[error("malformed field {field:?}: {value:?}")]
    Malformed { field: &'static str, value: String },
}

pub type ReplyResult<T> = Result<T, ReplyError>;
