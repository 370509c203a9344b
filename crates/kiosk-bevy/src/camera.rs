use crate::components::KioskCamera;
use crate::resources::AvatarSettings;
use bevy::prelude::*;

/// Camera and lights framing the avatar's head and shoulders
pub fn setup_stage(mut commands: Commands, settings: Res<AvatarSettings>) {
    let target = Vec3::from_array(settings.camera_target);

    commands.spawn((
        KioskCamera,
        Camera3d::default(),
        Transform::from_translation(Vec3::from_array(settings.camera_position))
            .looking_at(target, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        brightness: 400.0,
        ..default()
    });

    // Key light from the front right
    commands.spawn((
        DirectionalLight {
            illuminance: 4_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(2.0, 4.0, 4.0).looking_at(target, Vec3::Y),
    ));
}
