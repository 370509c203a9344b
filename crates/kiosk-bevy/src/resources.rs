use bevy::prelude::*;
use crossbeam_channel::Receiver;
use kiosk_control::{PostSpeech, Utterance, UtteranceEvent};
use kiosk_core::{AvatarSession, ClockReading, PlaybackClock, RoleNames, TimelinePlayback};
use serde::{Deserialize, Serialize};

/// Avatar asset and stage placement
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarSettings {
    /// glTF/GLB file, relative to the asset directory
    pub model_path: String,
    /// Avatar root position
    pub position: [f32; 3],
    /// Uniform avatar scale
    pub scale: f32,
    /// Camera position
    pub camera_position: [f32; 3],
    /// Point the camera looks at
    pub camera_target: [f32; 3],
    /// Node names for each avatar role
    pub roles: RoleNames,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            model_path: "models/avatar.glb".to_string(),
            position: [0.0, -1.0, 0.0],
            scale: 1.3,
            camera_position: [0.0, 1.2, 1.8],
            camera_target: [0.0, 0.9, 0.0],
            roles: RoleNames::default(),
        }
    }
}

/// The lip-sync session, keyed by scene entities
#[derive(Resource, Debug)]
pub struct AvatarAnimation(pub AvatarSession<Entity>);

/// Role names used when a scene finishes loading
#[derive(Resource, Debug, Clone, Default)]
pub struct AvatarRoles(pub RoleNames);

/// Source of the playback clock for the current utterance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpeechOutput {
    /// Nothing is playing
    #[default]
    Idle,
    /// The audio sink on this entity is the clock
    Audio(Entity),
    /// No audio; the frame-advanced timer is the clock
    Timed,
}

/// Playback clock plus the utterance it is playing
#[derive(Resource, Debug, Default)]
pub struct PlaybackState {
    /// Where the clock comes from
    pub output: SpeechOutput,
    /// Frame-advanced clock used when there is no audio
    pub playback: TimelinePlayback,
    /// Slot generation of the utterance being played
    pub generation: Option<u64>,
    /// Caption of the current utterance
    pub caption: Option<String>,
    /// Actions to run once playback ends
    pub post_speech: PostSpeech,
    sink_reading: ClockReading,
}

impl PlaybackState {
    /// Start an utterance timed by the frame clock
    pub fn begin(&mut self, utterance: &Utterance) {
        self.playback.start(utterance.timeline.end_time());
        self.start(utterance, SpeechOutput::Timed);
    }

    /// Start an utterance clocked by the audio sink on `audio`
    pub fn begin_audio(&mut self, utterance: &Utterance, audio: Entity) {
        self.playback.stop();
        self.sink_reading = ClockReading::default();
        self.start(utterance, SpeechOutput::Audio(audio));
    }

    fn start(&mut self, utterance: &Utterance, output: SpeechOutput) {
        self.output = output;
        self.generation = Some(utterance.generation);
        self.caption = Some(utterance.text.clone());
        self.post_speech = utterance.post_speech.clone();
    }

    /// Record the latest sink reading; `true` when playback has just ended
    pub fn follow_sink(&mut self, reading: ClockReading) -> bool {
        let finished = reading.ended && !self.sink_reading.ended;
        self.sink_reading = reading;
        finished
    }

    /// Hand back the caption and follow-up actions of the finished utterance
    pub fn finish(&mut self) -> (Option<String>, PostSpeech) {
        self.output = SpeechOutput::Idle;
        (
            self.caption.take(),
            std::mem::take(&mut self.post_speech),
        )
    }

    /// Current clock reading for the sampler
    pub fn reading(&self) -> ClockReading {
        match self.output {
            SpeechOutput::Audio(_) => self.sink_reading,
            SpeechOutput::Idle | SpeechOutput::Timed => self.playback.reading(),
        }
    }
}

/// Event stream from the utterance worker, if one is attached
#[derive(Resource, Debug, Default)]
pub struct UtteranceInbox(pub Option<Receiver<UtteranceEvent>>);

impl UtteranceInbox {
    /// Inbox fed by `receiver`
    pub fn new(receiver: Receiver<UtteranceEvent>) -> Self {
        Self(Some(receiver))
    }
}
