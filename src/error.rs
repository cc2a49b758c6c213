//! Error types for Chaos-Intel
//!
//! Lookup misses (unknown components, empty history) are never errors in this
//! crate; they resolve to documented defaults. Errors are reserved for
//! structurally invalid input and persistence failures.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Chaos-Intel error types
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is absent from a candidate experiment
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A duration string does not match `<int><s|m|h>`
    #[error("invalid duration {0:?}: expected <number><unit> (e.g. 30s, 5m, 1h)")]
    InvalidDuration(String),

    /// Model persistence blob could not be encoded or decoded
    #[error("model serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
