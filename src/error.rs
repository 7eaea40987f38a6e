//! Error handling utilities shared across the crate.

use std::collections::TryReserveError;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = WordFreqError> = std::result::Result<T, E>;

/// Domain-specific error describing failures during configuration, IO, or counting.
#[derive(Debug, Error)]
pub enum WordFreqError {
    /// Counting configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// A scan buffer or word payload could not be reserved.
    #[error("allocation failed: {0}")]
    Allocation(String),
    /// Serialization of a report or metrics failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Catch-all variant for invariants that should not occur.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for WordFreqError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<TryReserveError> for WordFreqError {
    fn from(err: TryReserveError) -> Self {
        Self::Allocation(err.to_string())
    }
}

impl WordFreqError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
