use bevy::prelude::*;

/// Root entity of the spawned avatar scene
#[derive(Component, Reflect, Default)]
#[reflect(Component)]
pub struct AvatarRoot;

/// Camera framing the avatar
#[derive(Component, Reflect, Default)]
#[reflect(Component)]
pub struct KioskCamera;

/// Entity playing the current utterance's audio
#[derive(Component, Reflect, Default)]
#[reflect(Component)]
pub struct SpeechAudio;
