//! Error types for Recovery Monitor

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for Recovery Monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// External tool could not be started (not installed, not on PATH)
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// External tool exited unsuccessfully
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// External tool did not finish in time
    #[error("Command timed out after {limit:?}: {program}")]
    Timeout { program: String, limit: Duration },

    /// Output of an external tool could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unsupported platform
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}
