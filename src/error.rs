//! Error types for the fallible edges of the engine.
//!
//! Geometry itself never fails: degenerate shapes are deleted and stale indices
//! are no-ops. Errors only come from configuration, persistence documents and
//! color strings supplied by the host.

use thiserror::Error;

/// Errors surfaced to the hosting application.
#[derive(Error, Debug)]
pub enum EngineError {
    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Color string is not a `#rrggbb` hex color
    #[error("Invalid color: '{value}'")]
    InvalidColor {
        /// The rejected color string
        value: String,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },

    /// Version mismatch between expected and found
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: u32,
        /// Found version
        found: u32,
    },
}

impl EngineError {
    /// Create an invalid color error.
    pub fn invalid_color(value: impl Into<String>) -> Self {
        Self::InvalidColor {
            value: value.into(),
        }
    }

    /// Create an invalid configuration error with a message.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
