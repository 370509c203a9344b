//! Error types for the utterance flow
use kiosk_core::CoreError;
use thiserror::Error;

/// Control errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered, but not with something usable
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend or asset URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Cue timeline or configuration rejected by the core
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Worker channel disconnected
    #[error("Utterance channel closed")]
    ChannelClosed,

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
