//! Error types for the animation core
use thiserror::Error;

/// Core error types
///
/// None of these are ever produced by the per-frame path; they surface only
/// from configuration validation and timeline parsing.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Cue timeline could not be parsed
    #[error("Invalid cue timeline: {0}")]
    Timeline(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
