use kiosk_core::{
    AnimationConfig, AvatarSession, ClockReading, Cue, CueTimeline, InMemoryRig, RoleNames,
    Smoothed, Vec3, VisemeMap,
};
use proptest::prelude::*;

const SYMBOLS: [&str; 11] = ["A", "B", "C", "D", "E", "F", "G", "H", "X", "Q", ""];

fn symbol() -> impl Strategy<Value = String> {
    prop::sample::select(SYMBOLS.to_vec()).prop_map(str::to_string)
}

/// Contiguous, sorted cues built from positive durations
fn contiguous_timeline() -> impl Strategy<Value = CueTimeline> {
    prop::collection::vec((0.01f64..0.5, symbol()), 1..30).prop_map(|parts| {
        let mut start = 0.0;
        let cues = parts
            .into_iter()
            .map(|(duration, value)| {
                let cue = Cue::new(start, start + duration, value);
                start += duration;
                cue
            })
            .collect();
        CueTimeline::from_cues(cues)
    })
}

/// Arbitrary, possibly overlapping or inverted cues
fn arbitrary_timeline() -> impl Strategy<Value = CueTimeline> {
    prop::collection::vec((-2.0f64..5.0, -2.0f64..5.0, symbol()), 0..30).prop_map(|cues| {
        CueTimeline::from_cues(
            cues.into_iter()
                .map(|(start, end, value)| Cue::new(start, end, value))
                .collect(),
        )
    })
}

fn reading() -> impl Strategy<Value = ClockReading> {
    (-1.0f64..10.0, any::<bool>(), any::<bool>()).prop_map(|(time, paused, ended)| ClockReading {
        time,
        paused,
        ended,
    })
}

proptest! {
    #[test]
    fn prop_lookup_inside_single_cue(timeline in contiguous_timeline(), index in any::<prop::sample::Index>(), frac in 0.01f64..0.99) {
        let cue = index.get(timeline.cues()).clone();
        let t = cue.start + (cue.end - cue.start) * frac;
        // Strictly inside exactly one cue of a contiguous timeline
        prop_assume!(t > cue.start && t < cue.end);
        prop_assert_eq!(timeline.active_cue(t), Some(&cue));
    }

    #[test]
    fn prop_lookup_outside_all_cues(timeline in contiguous_timeline(), gap in 0.001f64..10.0) {
        prop_assert!(timeline.active_cue(-gap).is_none());
        prop_assert!(timeline.active_cue(timeline.end_time() + gap).is_none());
    }

    #[test]
    fn prop_lookup_never_panics(timeline in arbitrary_timeline(), t in -5.0f64..10.0) {
        if let Some(found) = timeline.active_cue(t) {
            prop_assert!(found.contains(t));
            let first = timeline.cues().iter().find(|c| c.contains(t));
            prop_assert_eq!(first, Some(found));
        }
    }

    #[test]
    fn prop_unknown_symbol_is_silence(sym in "[a-z0-9_]{1,8}") {
        let map = VisemeMap::default();
        let target = map.resolve(Some(&sym));
        prop_assert_eq!(target.intensity, 0.0);
        prop_assert_eq!(target.channel, map.silence_channel.clone());
    }

    #[test]
    fn prop_smoothing_fixed_point(value in -10.0f32..10.0, alpha in 0.001f32..=1.0) {
        let mut scalar = Smoothed::new(value);
        scalar.step(alpha);
        prop_assert_eq!(scalar.current, value);

        let mut vector = Smoothed::new(Vec3::splat(value));
        vector.step(alpha);
        prop_assert_eq!(vector.current, Vec3::splat(value));
    }

    #[test]
    fn prop_smoothing_monotonic(start in -10.0f32..10.0, target in -10.0f32..10.0, alpha in 0.01f32..0.99, steps in 1usize..40) {
        let mut channel = Smoothed::new(start);
        channel.target = target;
        let mut distance = (channel.target - channel.current).abs();
        for _ in 0..steps {
            if distance < 1e-3 {
                break;
            }
            channel.step(alpha);
            let next = (channel.target - channel.current).abs();
            prop_assert!(next < distance, "distance {} did not shrink from {}", next, distance);
            distance = next;
        }
    }

    #[test]
    fn prop_alpha_one_snaps(start in -10.0f32..10.0, target in -10.0f32..10.0) {
        let mut channel = Smoothed::new(start);
        channel.target = target;
        channel.step(1.0);
        prop_assert_eq!(channel.current, target);
    }

    #[test]
    fn prop_at_most_one_face_target(timeline in arbitrary_timeline(), readings in prop::collection::vec(reading(), 1..40)) {
        let rig = InMemoryRig::new()
            .with_morph_node("Wolf3D_Head", &["viseme_aa", "viseme_O", "viseme_sil"]);
        let mut session =
            AvatarSession::new(AnimationConfig::default(), VisemeMap::default()).unwrap();
        session.bind_scene(rig.scene_nodes(), &RoleNames::default());
        session.timeline_slot().publish(timeline);

        for reading in readings {
            session.update(reading);
            let active = session
                .channels()
                .face()
                .iter()
                .filter(|c| c.weight.target != 0.0)
                .count();
            prop_assert!(active <= 1);
        }
    }

    #[test]
    fn prop_stalled_clock_targets_rest(timeline in contiguous_timeline(), time in -1.0f64..10.0, ended in any::<bool>()) {
        let rig = InMemoryRig::new()
            .with_morph_node("Wolf3D_Head", &["viseme_aa", "viseme_sil"])
            .with_node("Wolf3D_Teeth", kiosk_core::RestPose::new(Vec3::new(0.0, 1.5, 0.0), Vec3::ZERO));
        let mut session =
            AvatarSession::new(AnimationConfig::default(), VisemeMap::default()).unwrap();
        session.bind_scene(rig.scene_nodes(), &RoleNames::default());
        session.timeline_slot().publish(timeline);
        session.update(ClockReading::playing(time));

        let stalled = if ended { ClockReading::ended(time) } else { ClockReading::paused(time) };
        session.update(stalled);

        let channels = session.channels();
        prop_assert!(channels.face().iter().all(|c| c.weight.target == 0.0));
        prop_assert_eq!(channels.teeth_position.target, Vec3::new(0.0, 1.5, 0.0));
        prop_assert_eq!(channels.teeth_rotation.target, Vec3::ZERO);
    }
}
