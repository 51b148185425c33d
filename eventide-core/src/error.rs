//! Error types for eventide.
//!
//! These cover failures owned by the cache itself. Errors produced by a
//! caller's fetch operation are never converted into [`CacheError`]; the
//! cache hands them back untouched.

use thiserror::Error;

/// Result type alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Failures raised by the cache layer.
#[derive(Debug, Error)]
pub enum CacheError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration values are inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Config file could not be read.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvValue {
        /// Variable name
        name: String,
        /// Raw value
        value: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // RUNTIME ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The cache was built outside an async runtime, so the sweep
    /// task and background refreshes have nowhere to run.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

impl CacheError {
    /// Returns true if this error comes from configuration input.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CacheError::ConfigError(_)
                | CacheError::IoError(_)
                | CacheError::JsonError(_)
                | CacheError::InvalidEnvValue { .. }
        )
    }
}
