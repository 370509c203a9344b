//! Animation Channels - exponentially smoothed values
//!
//! Every visual attribute driven by the lip-sync engine is a channel with a
//! `current` and a `target`. Once per frame the sampler re-targets each
//! channel and advances it one smoothing step, whether or not the target
//! changed, so sub-frame phonemes never stair-step.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Linear interpolation in a value's native space
pub trait Lerp: Copy + PartialEq {
    /// Interpolate from `self` toward `target` by `alpha`
    fn lerp_to(self, target: Self, alpha: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, target: Self, alpha: f32) -> Self {
        self + (target - self) * alpha
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, target: Self, alpha: f32) -> Self {
        // Per-axis; rotation offsets are small Euler angles
        self.lerp(target, alpha)
    }
}

/// A single smoothed channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smoothed<T> {
    /// Value written to the mesh
    pub current: T,
    /// Value the channel is relaxing toward
    pub target: T,
}

impl<T: Lerp> Smoothed<T> {
    /// Create a channel at rest on `value`
    pub fn new(value: T) -> Self {
        Self {
            current: value,
            target: value,
        }
    }

    /// Advance one smoothing step toward `target`.
    ///
    /// `alpha >= 1` snaps exactly onto the target.
    pub fn step(&mut self, alpha: f32) {
        if self.current == self.target {
            return;
        }
        self.current = if alpha >= 1.0 {
            self.target
        } else {
            self.current.lerp_to(self.target, alpha)
        };
    }
}

/// Named face blend-shape channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceChannel {
    /// Blend-shape name
    pub name: String,
    /// Smoothed weight
    pub weight: Smoothed<f32>,
}

/// The full channel set for one bound avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSet {
    face: Vec<FaceChannel>,
    /// Teeth local position
    pub teeth_position: Smoothed<Vec3>,
    /// Teeth local rotation, Euler XYZ radians
    pub teeth_rotation: Smoothed<Vec3>,
}

impl ChannelSet {
    /// Create channels at rest: face weights at zero, teeth on the rest pose
    pub fn new(face_channels: &[String], rest_position: Vec3, rest_rotation: Vec3) -> Self {
        Self {
            face: face_channels
                .iter()
                .map(|name| FaceChannel {
                    name: name.clone(),
                    weight: Smoothed::new(0.0),
                })
                .collect(),
            teeth_position: Smoothed::new(rest_position),
            teeth_rotation: Smoothed::new(rest_rotation),
        }
    }

    /// Face channels in codomain order
    pub fn face(&self) -> &[FaceChannel] {
        &self.face
    }

    /// Look up a face channel by blend-shape name
    pub fn face_channel(&self, name: &str) -> Option<&FaceChannel> {
        self.face.iter().find(|channel| channel.name == name)
    }

    /// Reset every face target to zero, then raise the selected one.
    ///
    /// Visemes are mutually exclusive mouth shapes: at most one face
    /// channel carries a non-zero target after this call.
    pub fn retarget_face(&mut self, active: &str, weight: f32) {
        for channel in &mut self.face {
            channel.weight.target = if channel.name == active { weight } else { 0.0 };
        }
    }

    /// Set teeth targets
    pub fn retarget_teeth(&mut self, position: Vec3, rotation: Vec3) {
        self.teeth_position.target = position;
        self.teeth_rotation.target = rotation;
    }

    /// Advance every channel one smoothing step
    pub fn step(&mut self, alpha: f32) {
        for channel in &mut self.face {
            channel.weight.step(alpha);
        }
        self.teeth_position.step(alpha);
        self.teeth_rotation.step(alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_moves_fraction() {
        let mut channel = Smoothed::new(0.0_f32);
        channel.target = 1.0;
        channel.step(0.2);
        assert!((channel.current - 0.2).abs() < 1e-6);
        channel.step(0.2);
        assert!((channel.current - 0.36).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_one_snaps() {
        let mut channel = Smoothed::new(0.1_f32);
        channel.target = 0.3;
        channel.step(1.0);
        assert_eq!(channel.current, 0.3);
    }

    #[test]
    fn test_fixed_point_unchanged() {
        let mut channel = Smoothed::new(Vec3::new(0.1, -0.02, 0.3));
        channel.step(0.2);
        assert_eq!(channel.current, Vec3::new(0.1, -0.02, 0.3));
    }

    #[test]
    fn test_vec3_per_axis() {
        let mut channel = Smoothed::new(Vec3::ZERO);
        channel.target = Vec3::new(1.0, -1.0, 0.5);
        channel.step(0.5);
        assert!((channel.current - Vec3::new(0.5, -0.5, 0.25)).length() < 1e-6);
    }

    #[test]
    fn test_retarget_face_exclusive() {
        let names = vec!["a".to_string(), "b".to_string(), "rest".to_string()];
        let mut set = ChannelSet::new(&names, Vec3::ZERO, Vec3::ZERO);
        set.retarget_face("b", 0.7);
        let non_zero: Vec<&str> = set
            .face()
            .iter()
            .filter(|c| c.weight.target != 0.0)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(non_zero, vec!["b"]);

        set.retarget_face("missing", 1.0);
        assert!(set.face().iter().all(|c| c.weight.target == 0.0));
    }
}
