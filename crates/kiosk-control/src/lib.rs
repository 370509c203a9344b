//! Kiosk Control - Chat and speech backend integration
//!
//! This crate connects the avatar to the kiosk backend:
//! - **Backend client**: chat replies, speech synthesis and mouth-cue download
//! - **Utterance worker**: resolves requests off the render thread and
//!   publishes each new cue timeline into the session's timeline slot
//!
//! ## Modules
//!
//! - [`client`] - HTTP client for the backend
//! - [`utterance`] - Request/event types and the background worker
//! - [`error`] - Error types

#![warn(missing_docs)]

/// HTTP client for the backend
pub mod client;
/// Error types
pub mod error;
/// Utterance requests, events and worker
pub mod utterance;

pub use client::{BackendClient, BackendConfig, ChatReply, SpeechAsset};
pub use error::{ControlError, Result};
pub use utterance::{
    PostSpeech, Utterance, UtteranceEvent, UtterancePipeline, UtteranceRequest, UtteranceWorker,
};
