//! Construction-time configuration errors.
//!
//! Rejection of a seqno on the hot path (late, duplicate, buffer
//! full, buffer closed) is an expected event and reported through
//! `bool`/`Option` return values, never through these errors. Only a
//! misconfigured buffer fails at construction.

use thiserror::Error;

/// Errors raised when a buffer is constructed with invalid options.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("row size must be at least 1")]
    ZeroRowSize,

    #[error("number of rows must be at least 1")]
    ZeroRows,

    #[error("resize factor must be > 1 (got {0})")]
    InvalidResizeFactor(f64),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
