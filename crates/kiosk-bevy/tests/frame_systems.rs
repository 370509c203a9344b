//! Headless frame-loop tests for the avatar systems

use bevy::audio::{AudioPlayer, AudioSource};
use bevy::prelude::*;
use bevy::render::mesh::morph::MorphWeights;
use bevy::time::TimeUpdateStrategy;
use crossbeam_channel::{unbounded, Sender};
use kiosk_bevy::components::{AvatarRoot, SpeechAudio};
use kiosk_bevy::model::release_avatar;
use kiosk_bevy::resources::{AvatarAnimation, PlaybackState, SpeechOutput, UtteranceInbox};
use kiosk_bevy::systems::{
    lip_sync_system, pause_toggle_system, playback_clock_system, utterance_inbox_system,
};
use kiosk_control::{PostSpeech, Utterance, UtteranceEvent};
use kiosk_core::{
    AnimationConfig, AvatarSession, Cue, CueTimeline, FaceBinding, MeshBinding, RestPose,
    TeethBinding, VisemeMap,
};
use std::time::Duration;

const MORPHS: [&str; 3] = ["viseme_aa", "viseme_O", "viseme_sil"];

struct Harness {
    app: App,
    events: Sender<UtteranceEvent>,
    face: Entity,
    teeth: Entity,
}

fn harness() -> Harness {
    harness_with(|_| {})
}

/// Harness whose app can decode audio assets but has no output device
fn harness_with_audio_assets() -> Harness {
    harness_with(|app| {
        app.add_plugins(AssetPlugin::default());
        app.init_asset::<AudioSource>();
    })
}

fn harness_with(extra: impl FnOnce(&mut App)) -> Harness {
    let (events, inbox) = unbounded();
    let session =
        AvatarSession::new(AnimationConfig::default(), VisemeMap::default()).unwrap();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    extra(&mut app);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)));
    app.init_resource::<ButtonInput<KeyCode>>();
    app.insert_resource(AvatarAnimation(session));
    app.init_resource::<PlaybackState>();
    app.insert_resource(UtteranceInbox::new(inbox));
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

    let face = app
        .world_mut()
        .spawn(MorphWeights::new(vec![0.0; MORPHS.len()], None).unwrap())
        .id();
    let teeth = app.world_mut().spawn(Transform::from_xyz(0.0, 1.6, 0.0)).id();

    app.world_mut()
        .resource_mut::<AvatarAnimation>()
        .0
        .bind(MeshBinding {
            face: Some(FaceBinding {
                handle: face,
                morph_targets: MORPHS.iter().map(|s| s.to_string()).collect(),
            }),
            teeth: Some(TeethBinding {
                handle: teeth,
                rest: RestPose::new(kiosk_core::Vec3::new(0.0, 1.6, 0.0), kiosk_core::Vec3::ZERO),
            }),
        });

    Harness {
        app,
        events,
        face,
        teeth,
    }
}

fn open_jaw() -> CueTimeline {
    CueTimeline::from_cues(vec![Cue::new(0.0, 1.0, "D")])
}

impl Harness {
    /// Publish a one-second open-jaw utterance the way the worker does
    fn speak(&mut self, post_speech: PostSpeech) {
        let generation = self.publish(open_jaw());
        self.announce(open_jaw(), generation, post_speech, None);
    }

    /// Worker side, part one: swap the timeline into the slot
    fn publish(&mut self, timeline: CueTimeline) -> u64 {
        self.app
            .world()
            .resource::<AvatarAnimation>()
            .0
            .timeline_slot()
            .publish(timeline)
    }

    /// Worker side, part two: tell the render thread
    fn announce(
        &mut self,
        timeline: CueTimeline,
        generation: u64,
        post_speech: PostSpeech,
        audio: Option<Vec<u8>>,
    ) {
        self.events
            .send(UtteranceEvent::Started(Utterance {
                text: "Hello!".to_string(),
                audio_url: audio.as_ref().map(|_| "audio/hello.mp3".to_string()),
                audio,
                timeline,
                generation,
                post_speech,
            }))
            .unwrap();
    }

    fn weight(&self, morph: &str) -> f32 {
        let index = MORPHS.iter().position(|m| *m == morph).unwrap();
        self.app
            .world()
            .get::<MorphWeights>(self.face)
            .unwrap()
            .weights()[index]
    }

    fn run(&mut self, frames: usize) {
        for _ in 0..frames {
            self.app.update();
        }
    }

    fn jaw_weight(&self) -> f32 {
        self.weight("viseme_aa")
    }

    fn teeth_y(&self) -> f32 {
        self.app
            .world()
            .get::<Transform>(self.teeth)
            .unwrap()
            .translation
            .y
    }
}

#[test]
fn test_utterance_drives_jaw_and_relaxes_after_end() {
    let mut h = harness();
    h.speak(PostSpeech {
        action_url: Some("https://example.org".to_string()),
        map_target: Some("library".to_string()),
    });

    h.run(5);
    assert!(h.jaw_weight() > 0.5, "jaw weight {}", h.jaw_weight());
    assert!(h.teeth_y() < 1.6);
    assert_eq!(
        h.app.world().resource::<PlaybackState>().caption.as_deref(),
        Some("Hello!")
    );

    h.run(40);
    let state = h.app.world().resource::<PlaybackState>();
    assert!(state.playback.is_ended());
    assert!(state.caption.is_none());
    assert!(state.post_speech.is_empty());
    assert!(h.jaw_weight() < 0.1, "jaw weight {}", h.jaw_weight());
}

#[test]
fn test_space_pauses_playback() {
    let mut h = harness();
    h.speak(PostSpeech::default());
    h.run(4);

    h.app
        .world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .press(KeyCode::Space);
    h.app.update();
    h.app.world_mut().resource_mut::<ButtonInput<KeyCode>>().clear();

    let position = h.app.world().resource::<PlaybackState>().playback.position();
    let before = h.jaw_weight();
    h.run(10);

    let state = h.app.world().resource::<PlaybackState>();
    assert_eq!(state.playback.position(), position);
    assert!(h.jaw_weight() < before);
}

#[test]
fn test_failed_utterance_leaves_avatar_idle() {
    let mut h = harness();
    h.events
        .send(UtteranceEvent::Failed {
            text: "where?".to_string(),
            reason: "offline".to_string(),
        })
        .unwrap();
    h.run(3);

    assert!(h.app.world().resource::<PlaybackState>().caption.is_none());
    assert_eq!(h.jaw_weight(), 0.0);
    assert_eq!(h.teeth_y(), 1.6);
}

#[test]
fn test_despawning_avatar_tears_down_session() {
    let mut h = harness();
    h.speak(PostSpeech::default());
    let root = h.app.world_mut().spawn(AvatarRoot).id();
    h.run(2);

    h.app.world_mut().despawn(root);
    let animation = h.app.world().resource::<AvatarAnimation>();
    assert!(animation.0.binding().is_empty());
    assert!(animation.0.timeline_slot().load().is_none());
}

#[test]
fn test_timeline_published_before_its_event_stays_silent() {
    let mut h = harness();
    h.speak(PostSpeech::default());
    h.run(6);
    assert!(h.weight("viseme_aa") > 0.5);

    // The worker has swapped the slot but the event is still in flight
    let next = CueTimeline::from_cues(vec![Cue::new(0.0, 0.1, "X"), Cue::new(0.1, 5.0, "E")]);
    let generation = h.publish(next.clone());
    h.run(2);
    assert_eq!(h.weight("viseme_O"), 0.0);

    h.announce(next, generation, PostSpeech::default(), None);
    h.run(8);
    assert!(h.weight("viseme_O") > 0.3, "viseme_O {}", h.weight("viseme_O"));
}

#[test]
fn test_superseded_event_is_skipped() {
    let mut h = harness();
    let first = h.publish(open_jaw());
    let second = h.publish(open_jaw());
    h.announce(open_jaw(), first, PostSpeech::default(), None);
    h.run(1);

    assert_eq!(h.app.world().resource::<PlaybackState>().generation, None);

    h.announce(open_jaw(), second, PostSpeech::default(), None);
    h.run(1);
    assert_eq!(
        h.app.world().resource::<PlaybackState>().generation,
        Some(second)
    );
}

#[test]
fn test_audio_without_output_uses_frame_clock() {
    let mut h = harness();
    let generation = h.publish(open_jaw());
    h.announce(open_jaw(), generation, PostSpeech::default(), Some(vec![0xff, 0xfb, 0x90]));
    h.run(5);

    let state = h.app.world().resource::<PlaybackState>();
    assert_eq!(state.output, SpeechOutput::Timed);
    assert!(h.jaw_weight() > 0.5);
}

#[test]
fn test_audio_utterance_waits_for_its_sink() {
    let mut h = harness_with_audio_assets();
    let generation = h.publish(open_jaw());
    h.announce(open_jaw(), generation, PostSpeech::default(), Some(vec![0xff, 0xfb, 0x90]));
    h.run(5);

    let SpeechOutput::Audio(audio) = h.app.world().resource::<PlaybackState>().output else {
        panic!("expected audio output");
    };
    let entity = h.app.world().entity(audio);
    assert!(entity.contains::<AudioPlayer>());
    assert!(entity.contains::<SpeechAudio>());

    // Nothing attaches a sink here, so the clock never starts
    assert_eq!(h.jaw_weight(), 0.0);
    assert_eq!(
        h.app.world().resource::<PlaybackState>().caption.as_deref(),
        Some("Hello!")
    );

    // A newer utterance replaces the audio entity
    let generation = h.publish(open_jaw());
    h.announce(open_jaw(), generation, PostSpeech::default(), Some(vec![0xff, 0xfb, 0x90]));
    h.run(1);
    assert!(h.app.world().get_entity(audio).is_err());
}
