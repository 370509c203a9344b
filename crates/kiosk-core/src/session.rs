//! Avatar Animation Session - the per-frame lip-sync driver
//!
//! The session owns everything the frame sampler needs: bindings, the
//! channel set, the captured rest pose and a handle to the current-timeline
//! slot. The render loop calls [`AvatarSession::tick`] once per frame with
//! one clock reading; the utterance loader only ever touches the slot.

use crate::binding::{AvatarRig, MeshBinding, RestPose, SceneNode};
use crate::channel::ChannelSet;
use crate::clock::ClockReading;
use crate::config::{AnimationConfig, RoleNames};
use crate::error::Result;
use crate::slot::TimelineSlot;
use crate::timeline::Seconds;
use crate::viseme::VisemeMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// What the sampler resolved for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Clock time the frame was sampled at
    pub time: Seconds,
    /// Symbol of the active cue; `None` when silent or when the symbol has
    /// no entry in the viseme map
    pub viseme: Option<String>,
    /// Face channel selected this frame
    pub channel: String,
    /// Jaw intensity used for both face and teeth targets
    pub intensity: f32,
    /// Whether a newly published timeline was first observed this frame
    pub swapped: bool,
}

impl FrameReport {
    /// Whether the frame was sampled as silence
    pub fn is_silent(&self) -> bool {
        self.viseme.is_none()
    }
}

/// Single owned lip-sync state for one avatar.
///
/// Clones share the same timeline slot.
#[derive(Debug, Clone)]
pub struct AvatarSession<H> {
    config: AnimationConfig,
    visemes: VisemeMap,
    slot: TimelineSlot,
    binding: MeshBinding<H>,
    /// Morph weight index for each face channel, in channel order
    face_slots: Vec<Option<usize>>,
    rest: Option<RestPose>,
    channels: ChannelSet,
    last_generation: Option<u64>,
}

impl<H> AvatarSession<H> {
    /// Create an unbound session with a fresh timeline slot
    pub fn new(config: AnimationConfig, visemes: VisemeMap) -> Result<Self> {
        Self::with_slot(config, visemes, TimelineSlot::new())
    }

    /// Create an unbound session reading from an existing slot
    pub fn with_slot(
        config: AnimationConfig,
        visemes: VisemeMap,
        slot: TimelineSlot,
    ) -> Result<Self> {
        config.validate()?;
        visemes.validate()?;

        let rest = RestPose::default();
        let channels = ChannelSet::new(&visemes.channels(), rest.position, rest.rotation);

        Ok(Self {
            config,
            visemes,
            slot,
            binding: MeshBinding::empty(),
            face_slots: Vec::new(),
            rest: None,
            channels,
            last_generation: None,
        })
    }

    /// Handle for publishing timelines from the utterance loader
    pub fn timeline_slot(&self) -> TimelineSlot {
        self.slot.clone()
    }

    /// Animation tuning
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Viseme mapping table
    pub fn viseme_map(&self) -> &VisemeMap {
        &self.visemes
    }

    /// Current channel state
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Current mesh binding
    pub fn binding(&self) -> &MeshBinding<H> {
        &self.binding
    }

    /// Rest pose used as the teeth baseline, once captured
    pub fn rest_pose(&self) -> Option<RestPose> {
        self.rest
    }

    /// Install a mesh binding and rebuild the channel set.
    ///
    /// The teeth rest pose is captured on the first bind only; later binds
    /// (asset reloads) keep offsetting from the first capture.
    pub fn bind(&mut self, binding: MeshBinding<H>) {
        if let Some(teeth) = &binding.teeth {
            if self.rest.is_none() {
                self.rest = Some(teeth.rest);
            } else {
                debug!("Rebinding teeth; keeping rest pose {:?}", self.rest);
            }
        }

        self.binding = binding;
        self.rebuild_channels();

        info!(
            "Avatar bound (face: {}, teeth: {})",
            self.binding.face.is_some(),
            self.binding.teeth.is_some()
        );
    }

    /// Resolve roles from a scene walk and bind the result
    pub fn bind_scene(&mut self, nodes: impl IntoIterator<Item = SceneNode<H>>, roles: &RoleNames) {
        self.bind(MeshBinding::from_scene(nodes, roles));
    }

    /// Swap the viseme table, re-deriving face channels
    pub fn set_viseme_map(&mut self, visemes: VisemeMap) -> Result<()> {
        visemes.validate()?;
        self.visemes = visemes;
        self.rebuild_channels();
        Ok(())
    }

    /// Release bindings, channel state, rest pose and the current timeline
    pub fn teardown(&mut self) {
        self.binding = MeshBinding::empty();
        self.rest = None;
        self.slot.clear();
        self.last_generation = None;
        self.rebuild_channels();
        info!("Avatar session torn down");
    }

    fn rebuild_channels(&mut self) {
        let names = self.visemes.channels();
        let rest = self.rest.unwrap_or_default();

        self.face_slots = match &self.binding.face {
            Some(face) => names
                .iter()
                .map(|name| {
                    let index = face.morph_index(name);
                    if index.is_none() {
                        debug!("Face mesh has no blend shape '{}'", name);
                    }
                    index
                })
                .collect(),
            None => Vec::new(),
        };
        self.channels = ChannelSet::new(&names, rest.position, rest.rotation);
    }

    /// Compute targets and advance every channel for one frame.
    ///
    /// Pure function of the session state and `reading`: the slot is loaded
    /// exactly once, so every channel sees the same timeline and time.
    pub fn update(&mut self, reading: ClockReading) -> FrameReport {
        self.sample(reading, None)
    }

    /// Like [`AvatarSession::update`], for a clock that belongs to the
    /// timeline published under `clock_generation`.
    ///
    /// Any other slot contents are sampled as silence until the host
    /// restarts its clock for them.
    pub fn update_for(
        &mut self,
        reading: ClockReading,
        clock_generation: Option<u64>,
    ) -> FrameReport {
        self.sample(reading, Some(clock_generation))
    }

    fn sample(
        &mut self,
        reading: ClockReading,
        clock_generation: Option<Option<u64>>,
    ) -> FrameReport {
        let bound = self.slot.load();
        let generation = bound.as_ref().map(|b| b.generation);
        let swapped = generation.is_some() && generation != self.last_generation;
        self.last_generation = generation;

        let foreign_clock = clock_generation.is_some_and(|expected| expected != generation);
        if foreign_clock && swapped {
            debug!(
                "Timeline generation {:?} published ahead of its clock ({:?})",
                generation,
                clock_generation.flatten()
            );
        }

        // Stalled clocks, missing timelines, the swap frame and a clock still
        // running for an older timeline all relax to rest
        let symbol = if reading.is_stalled() || swapped || foreign_clock {
            None
        } else {
            bound
                .as_deref()
                .and_then(|b| b.timeline.active_cue(reading.time))
                .map(|cue| cue.value.as_str())
        };

        let target = self.visemes.resolve(symbol);
        let symbol = symbol.filter(|s| {
            let mapped = self.visemes.entries.contains_key(*s);
            if !mapped {
                trace!("unmapped viseme {:?} sampled as silence", s);
            }
            mapped
        });
        let rest = self.rest.unwrap_or_default();
        let teeth = self.config.teeth;

        self.channels.retarget_face(&target.channel, target.intensity);
        self.channels.retarget_teeth(
            rest.position + teeth.position(target.intensity),
            rest.rotation + teeth.rotation(target.intensity),
        );
        self.channels.step(self.config.smoothing);

        let report = FrameReport {
            time: reading.time,
            viseme: symbol.map(str::to_string),
            channel: target.channel,
            intensity: target.intensity,
            swapped,
        };
        trace!(
            "t={:.3} viseme={:?} intensity={:.2}",
            report.time,
            report.viseme,
            report.intensity
        );
        report
    }

    /// Write current channel values onto the bound mesh sub-objects.
    ///
    /// Unbound roles are skipped; each group is independent of the other.
    pub fn apply<R>(&self, rig: &mut R)
    where
        R: AvatarRig<Handle = H>,
    {
        if let Some(face) = &self.binding.face {
            if let Some(weights) = rig.morph_weights(&face.handle) {
                for (channel, slot) in self.channels.face().iter().zip(&self.face_slots) {
                    if let Some(weight) = slot.and_then(|index| weights.get_mut(index)) {
                        *weight = channel.weight.current;
                    }
                }
            }
        }

        if let Some(teeth) = &self.binding.teeth {
            rig.set_local_pose(
                &teeth.handle,
                self.channels.teeth_position.current,
                self.channels.teeth_rotation.current,
            );
        }
    }

    /// Run one full frame: sample, smooth, write
    pub fn tick<R>(&mut self, reading: ClockReading, rig: &mut R) -> FrameReport
    where
        R: AvatarRig<Handle = H>,
    {
        let report = self.update(reading);
        self.apply(rig);
        report
    }

    /// Run one full frame against a clock started for `clock_generation`
    pub fn tick_for<R>(
        &mut self,
        reading: ClockReading,
        clock_generation: Option<u64>,
        rig: &mut R,
    ) -> FrameReport
    where
        R: AvatarRig<Handle = H>,
    {
        let report = self.update_for(reading, clock_generation);
        self.apply(rig);
        report
    }
}
