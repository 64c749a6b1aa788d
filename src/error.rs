//! Error types for the yolo-eval library.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Role;

/// Result type for yolo-eval operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Error types that can occur during detection evaluation.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Malformed line in a label file.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A label file has no counterpart on the other side.
    #[error("No {role} labels found for image '{image}'")]
    MissingPair { image: String, role: Role },

    /// IoU denominator is zero (both boxes degenerate).
    #[error("IoU undefined: union area is {union} for boxes {first} and {second}")]
    DivisionByZero {
        first: String,
        second: String,
        union: f64,
    },

    /// Class id with no display name.
    #[error("Unknown class id: {0}")]
    ClassLookupMiss(u32),

    /// Invalid IoU threshold.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Unrecognized option value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error parsing a TOML configuration file.
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
}
