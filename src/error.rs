//! Engine error types
//!
//! Only construction failures are fatal. Storage problems are reported through
//! [`EngineError::Storage`] but every caller degrades to a default instead of
//! aborting the simulation.

use thiserror::Error;

/// Errors produced by the engine and its host seams
#[derive(Debug, Error)]
pub enum EngineError {
    /// The drawable surface could not produce a usable drawing context
    #[error("drawable surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// A configuration value is outside its usable range
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// Configuration JSON could not be parsed
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Key-value store read or write failed
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
