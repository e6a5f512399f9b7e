//! Error types for the aggro crate.
//!
//! Query evaluation itself never fails: malformed declarative input is a
//! no-op and incompatible values reduce to `NaN`. Errors only surface at the
//! edges, when building a regex filter or when reading a [`Value`] back as a
//! concrete Rust type.
//!
//! [`Value`]: crate::Value

use thiserror::Error;

/// Errors that can occur when building queries or converting values.
#[derive(Debug, Error)]
pub enum AggroError {
    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// A value was not of the kind the caller asked for.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result type for aggro operations.
pub type Result<T> = std::result::Result<T, AggroError>;
