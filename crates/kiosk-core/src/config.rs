//! Animation configuration
//!
//! Tuning constants for the lip-sync engine, lifted out of the sampler so a
//! rig can be retuned from the kiosk configuration file.

use crate::error::{CoreError, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Maximum teeth displacement at full jaw intensity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeethOffsets {
    /// Local Y translation in meters (negative drops the jaw)
    pub position_y: f32,
    /// Local Z translation in meters
    pub position_z: f32,
    /// Local X rotation in radians
    pub rotation_x: f32,
}

impl Default for TeethOffsets {
    fn default() -> Self {
        Self {
            position_y: -0.02,
            position_z: 0.01,
            rotation_x: 0.2,
        }
    }
}

impl TeethOffsets {
    /// Position offset at `intensity`
    pub fn position(&self, intensity: f32) -> Vec3 {
        Vec3::new(0.0, self.position_y, self.position_z) * intensity
    }

    /// Rotation offset at `intensity`
    pub fn rotation(&self, intensity: f32) -> Vec3 {
        Vec3::new(self.rotation_x, 0.0, 0.0) * intensity
    }
}

/// Lip-sync animation tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Per-frame smoothing factor in `(0, 1]`; `1.0` snaps instantly
    pub smoothing: f32,
    /// Teeth displacement scale factors
    pub teeth: TeethOffsets,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.2,
            teeth: TeethOffsets::default(),
        }
    }
}

impl AnimationConfig {
    /// Config with a specific smoothing factor
    pub fn with_smoothing(smoothing: f32) -> Self {
        Self {
            smoothing,
            ..Self::default()
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(CoreError::Config(format!(
                "smoothing must lie in (0, 1], got {}",
                self.smoothing
            )));
        }
        let offsets = [
            self.teeth.position_y,
            self.teeth.position_z,
            self.teeth.rotation_x,
        ];
        if offsets.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::Config(
                "teeth offsets must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scene-graph node names for each logical avatar role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleNames {
    /// Candidate names for the face mesh carrying viseme blend shapes
    pub face: Vec<String>,
    /// Candidate names for the teeth mesh
    pub teeth: Vec<String>,
}

impl Default for RoleNames {
    fn default() -> Self {
        Self {
            face: vec!["Wolf3D_Head".to_string(), "Wolf3D_Avatar".to_string()],
            teeth: vec!["Wolf3D_Teeth".to_string()],
        }
    }
}

impl RoleNames {
    /// Whether `name` is a face node
    pub fn is_face(&self, name: &str) -> bool {
        self.face.iter().any(|n| n == name)
    }

    /// Whether `name` is a teeth node
    pub fn is_teeth(&self, name: &str) -> bool {
        self.teeth.iter().any(|n| n == name)
    }
}
