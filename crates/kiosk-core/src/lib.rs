//! Kiosk Core - Audio-synchronized facial animation
//!
//! This crate contains the renderer-agnostic lip-sync engine for the kiosk
//! avatar, including:
//! - Cue timelines and the viseme mapping table
//! - Smoothed animation channels
//! - The per-frame sampler and avatar session
//! - Scene-graph binding and rest-pose capture
//! - Playback clock abstraction
//! - Animation and logging configuration

#![warn(missing_docs)]

pub use glam::Vec3;

pub mod binding;
pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod slot;
pub mod timeline;
pub mod viseme;

// --- Re-exports grouped by category ---

// Timeline & Mapping
pub use timeline::{Cue, CueTimeline, Seconds};
pub use viseme::{Viseme, VisemeMap, VisemeTarget};

// Channels & Sampling
pub use channel::{ChannelSet, FaceChannel, Lerp, Smoothed};
pub use session::{AvatarSession, FrameReport};
pub use slot::{BoundTimeline, TimelineSlot};

// Binding & Clock
pub use binding::{
    AvatarRig, FaceBinding, InMemoryRig, MeshBinding, RestPose, RigNode, SceneNode, TeethBinding,
};
pub use clock::{ClockReading, ManualClock, PlaybackClock, TimelinePlayback};

// Configuration & Errors
pub use config::{AnimationConfig, RoleNames, TeethOffsets};
pub use error::{CoreError, Result};
pub use logging::LogConfig;
