use crate::audio::{spawn_speech_audio, toggle_sink, SinkClock};
use crate::components::SpeechAudio;
use crate::resources::{AvatarAnimation, PlaybackState, SpeechOutput, UtteranceInbox};
use crate::to_bevy;
use bevy::audio::{AudioSink, AudioSource};
use bevy::prelude::*;
use bevy::render::mesh::morph::MorphWeights;
use kiosk_control::UtteranceEvent;
use kiosk_core::{AvatarRig, PlaybackClock};
use tracing::{debug, info, trace, warn};

/// Scene entities seen through the queries of one system run
pub struct BevyRig<'w1, 's1, 'w2, 's2> {
    weights: Query<'w1, 's1, &'static mut MorphWeights>,
    transforms: Query<'w2, 's2, &'static mut Transform>,
}

impl<'w1, 's1, 'w2, 's2> BevyRig<'w1, 's1, 'w2, 's2> {
    /// Wrap the morph weight and transform queries
    pub fn new(
        weights: Query<'w1, 's1, &'static mut MorphWeights>,
        transforms: Query<'w2, 's2, &'static mut Transform>,
    ) -> Self {
        Self {
            weights,
            transforms,
        }
    }
}

impl AvatarRig for BevyRig<'_, '_, '_, '_> {
    type Handle = Entity;

    fn morph_weights(&mut self, face: &Entity) -> Option<&mut [f32]> {
        self.weights
            .get_mut(*face)
            .ok()
            .map(|weights| weights.into_inner().weights_mut())
    }

    fn set_local_pose(
        &mut self,
        node: &Entity,
        position: kiosk_core::Vec3,
        rotation: kiosk_core::Vec3,
    ) {
        if let Ok(mut transform) = self.transforms.get_mut(*node) {
            transform.translation = to_bevy(position);
            transform.rotation = Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
        }
    }
}

/// Frame sampler: one clock reading, one timeline load, every channel.
///
/// Only the timeline the clock was started for is sampled; one published
/// ahead of its `Started` event stays silent until playback restarts.
pub fn lip_sync_system(
    playback: Res<PlaybackState>,
    mut animation: ResMut<AvatarAnimation>,
    weights: Query<&'static mut MorphWeights>,
    transforms: Query<&'static mut Transform>,
) {
    let mut rig = BevyRig::new(weights, transforms);
    let report = animation
        .0
        .tick_for(playback.reading(), playback.generation, &mut rig);
    if report.swapped {
        trace!("New timeline observed at t={:.3}", report.time);
    }
}

/// Advance the playback clock and run post-speech actions at the end
pub fn playback_clock_system(
    mut commands: Commands,
    time: Res<Time>,
    mut state: ResMut<PlaybackState>,
    sinks: Query<&AudioSink, With<SpeechAudio>>,
) {
    let output = state.output;
    let finished = match output {
        SpeechOutput::Idle => false,
        SpeechOutput::Timed => state.playback.advance(time.delta_secs_f64()),
        SpeechOutput::Audio(entity) => match sinks.get(entity) {
            Ok(sink) => {
                let finished = state.follow_sink(SinkClock(sink).reading());
                if finished {
                    commands.entity(entity).despawn();
                }
                finished
            }
            // Bevy attaches the sink once the source is decoded
            Err(_) => false,
        },
    };
    if !finished {
        return;
    }

    let (caption, actions) = state.finish();
    info!("Finished speaking: \"{}\"", caption.unwrap_or_default());
    if let Some(target) = &actions.map_target {
        info!("Post-speech: show map location '{}'", target);
    }
    if let Some(url) = &actions.action_url {
        info!("Post-speech: open {}", url);
    }
}

/// Drain worker events and start playback of new utterances
pub fn utterance_inbox_system(
    mut commands: Commands,
    inbox: Res<UtteranceInbox>,
    animation: Res<AvatarAnimation>,
    mut state: ResMut<PlaybackState>,
    mut audio_sources: Option<ResMut<Assets<AudioSource>>>,
) {
    let Some(receiver) = &inbox.0 else {
        return;
    };

    for event in receiver.try_iter() {
        match event {
            UtteranceEvent::Started(mut utterance) => {
                let current = animation.0.timeline_slot().generation();
                if current.is_some_and(|current| utterance.generation < current) {
                    debug!(
                        "Skipping superseded utterance \"{}\" (generation {})",
                        utterance.text, utterance.generation
                    );
                    continue;
                }

                if let SpeechOutput::Audio(previous) = state.output {
                    commands.entity(previous).despawn();
                }

                info!(
                    "Speaking: \"{}\" ({:.2}s)",
                    utterance.text,
                    utterance.timeline.end_time()
                );
                match (utterance.audio.take(), audio_sources.as_deref_mut()) {
                    (Some(bytes), Some(sources)) => {
                        let audio = spawn_speech_audio(&mut commands, sources, bytes);
                        state.begin_audio(&utterance, audio);
                    }
                    (Some(_), None) => {
                        warn!("No audio output; timing \"{}\" by frame clock", utterance.text);
                        state.begin(&utterance);
                    }
                    (None, _) => state.begin(&utterance),
                }
            }
            UtteranceEvent::Failed { text, reason } => {
                warn!("Could not speak \"{}\": {}", text, reason);
            }
        }
    }
}

/// Space toggles playback pause
pub fn pause_toggle_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut state: ResMut<PlaybackState>,
    sinks: Query<&AudioSink, With<SpeechAudio>>,
) {
    if !keys.just_pressed(KeyCode::Space) {
        return;
    }

    let output = state.output;
    let paused = match output {
        SpeechOutput::Audio(entity) => match sinks.get(entity) {
            Ok(sink) => toggle_sink(sink),
            Err(_) => return,
        },
        SpeechOutput::Idle | SpeechOutput::Timed => state.playback.toggle_pause(),
    };
    info!("Playback {}", if paused { "paused" } else { "resumed" });
}
