//! Error types for `cps-bus`.

use cps_core::CpsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    /// The delivery thread has stopped; nothing more can be published.
    #[error("bus is disconnected")]
    Disconnected,

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("publish to {topic:?} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CpsError),
}

pub type BusResult<T> = Result<T, BusError>;
