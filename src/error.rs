//! # Error Types
//!
//! Custom error types for Robot Dash using `thiserror`.
//!
//! The state engine itself never fails: malformed input degrades to a logged
//! no-op. These errors cover the edges around it (configuration, transport,
//! recording export/import).

use thiserror::Error;

/// Main error type for Robot Dash
#[derive(Debug, Error)]
pub enum DashError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport errors (connect, framing, write)
    #[error("Connection error: {0}")]
    Connection(String),

    /// No completed recording at the requested index
    #[error("Recording not found at index {0}")]
    RecordingNotFound(usize),
}

/// Result type alias for Robot Dash
pub type Result<T> = std::result::Result<T, DashError>;
