//! Speech audio output
//!
//! Each utterance with sound gets its own [`AudioPlayer`] entity. Once Bevy
//! has decoded the source it attaches an [`AudioSink`], and from then on the
//! sink is the playback clock the lip-sync sampler follows.

use crate::components::SpeechAudio;
use bevy::audio::{AudioPlayer, AudioSink, AudioSinkPlayback, AudioSource, PlaybackSettings};
use bevy::prelude::*;
use kiosk_core::{ClockReading, PlaybackClock};
use std::sync::Arc;

/// Playback clock read from an audio sink
pub struct SinkClock<'a>(pub &'a AudioSink);

impl PlaybackClock for SinkClock<'_> {
    fn reading(&self) -> ClockReading {
        ClockReading {
            time: self.0.position().as_secs_f64(),
            paused: self.0.is_paused(),
            ended: self.0.empty(),
        }
    }
}

/// Register encoded audio and start playing it once
pub fn spawn_speech_audio(
    commands: &mut Commands,
    sources: &mut Assets<AudioSource>,
    bytes: Vec<u8>,
) -> Entity {
    let bytes: Arc<[u8]> = bytes.into();
    let handle = sources.add(AudioSource { bytes });
    commands
        .spawn((AudioPlayer::new(handle), PlaybackSettings::ONCE, SpeechAudio))
        .id()
}

/// Pause or resume a sink, returning whether it is now paused
pub fn toggle_sink(sink: &AudioSink) -> bool {
    if sink.is_paused() {
        sink.play();
        false
    } else {
        sink.pause();
        true
    }
}
