//! Bevy integration for the kiosk avatar.
//!
//! This crate drives the renderer-agnostic lip-sync session from Bevy's
//! frame loop. It spawns the glTF avatar and binds face and teeth when the
//! scene is ready. Speech audio plays through `bevy_audio`, and its sink
//! position clocks the blend-shape weights and teeth transform written every
//! `Update`.

pub mod audio;
pub mod camera;
pub mod components;
pub mod model;
pub mod resources;
pub mod systems;

use bevy::prelude::*;
use camera::*;
use components::*;
use crossbeam_channel::Receiver;
use kiosk_control::UtteranceEvent;
use kiosk_core::AvatarSession;
use model::*;
use resources::*;
use systems::*;
use tracing::info;

/// Convert a core vector into Bevy's math type
pub fn to_bevy(v: kiosk_core::Vec3) -> Vec3 {
    Vec3::from_array(v.to_array())
}

/// Convert a Bevy vector into the core math type
pub fn to_core(v: Vec3) -> kiosk_core::Vec3 {
    kiosk_core::Vec3::from_array(v.to_array())
}

/// Avatar rendering and lip-sync plugin
pub struct AvatarPlugin {
    session: AvatarSession<Entity>,
    settings: AvatarSettings,
    events: Option<Receiver<UtteranceEvent>>,
}

impl AvatarPlugin {
    /// Create the plugin around a configured session
    pub fn new(session: AvatarSession<Entity>, settings: AvatarSettings) -> Self {
        Self {
            session,
            settings,
            events: None,
        }
    }

    /// Start utterances reported by a worker
    pub fn with_events(mut self, events: Receiver<UtteranceEvent>) -> Self {
        self.events = Some(events);
        self
    }
}

impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        info!("Initializing avatar plugin...");

        // Register resources
        app.insert_resource(self.settings.clone());
        app.insert_resource(AvatarRoles(self.settings.roles.clone()));
        app.insert_resource(AvatarAnimation(self.session.clone()));
        app.init_resource::<PlaybackState>();
        app.insert_resource(match &self.events {
            Some(events) => UtteranceInbox::new(events.clone()),
            None => UtteranceInbox::default(),
        });

        // Register components
        app.register_type::<AvatarRoot>();
        app.register_type::<KioskCamera>();
        app.register_type::<SpeechAudio>();

        // Register systems
        app.add_systems(Startup, (setup_stage, spawn_avatar));
        app.add_observer(bind_avatar_scene);
        app.add_observer(release_avatar);
        app.add_systems(
            Update,
            (
                utterance_inbox_system,
                pause_toggle_system,
                playback_clock_system,
                lip_sync_system,
            )
                .chain(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_conversion() {
        let v = kiosk_core::Vec3::new(0.0, -0.02, 0.01);
        assert_eq!(to_core(to_bevy(v)), v);
    }

    #[test]
    fn test_default_settings_match_stage() {
        let settings = AvatarSettings::default();
        assert_eq!(settings.position, [0.0, -1.0, 0.0]);
        assert_eq!(settings.scale, 1.3);
        assert_eq!(settings.camera_position, [0.0, 1.2, 1.8]);
    }

    #[test]
    fn test_rest_pose_from_transform() {
        let transform = Transform::from_xyz(0.0, 1.6, 0.02)
            .with_rotation(Quat::from_euler(EulerRot::XYZ, 0.2, 0.0, 0.0));
        let rest = rest_pose(&transform);
        assert!((rest.position.y - 1.6).abs() < 1e-6);
        assert!((rest.rotation.x - 0.2).abs() < 1e-5);
        assert!(rest.rotation.y.abs() < 1e-5);
    }
}
