//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CpsError` as one
//! variant via `From`.

use thiserror::Error;

/// The base error type shared by all `cps-*` crates.
#[derive(Debug, Error)]
pub enum CpsError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `cps-core`.
pub type CpsResult<T> = Result<T, CpsError>;
