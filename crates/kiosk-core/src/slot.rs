//! Timeline slot - the single shared reference between loader and sampler
//!
//! The utterance loader runs off the render thread and replaces the current
//! timeline; the frame sampler loads it once per frame. Both sides only ever
//! see a whole timeline or none at all.

use crate::timeline::CueTimeline;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A published timeline tagged with the generation it was published under
#[derive(Debug)]
pub struct BoundTimeline {
    /// Monotonic publish counter, starting at 1
    pub generation: u64,
    /// The timeline itself
    pub timeline: CueTimeline,
}

#[derive(Debug, Default)]
struct SlotInner {
    current: ArcSwapOption<BoundTimeline>,
    next_generation: AtomicU64,
}

/// Cloneable handle to the current-timeline reference
#[derive(Debug, Clone, Default)]
pub struct TimelineSlot {
    inner: Arc<SlotInner>,
}

impl TimelineSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the current timeline, returning its generation
    pub fn publish(&self, timeline: CueTimeline) -> u64 {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        if !timeline.is_well_formed() {
            debug!(
                "Publishing malformed timeline (generation {}, {} cues); lookups will be best-effort",
                generation,
                timeline.len()
            );
        }
        self.inner.current.store(Some(Arc::new(BoundTimeline {
            generation,
            timeline,
        })));
        generation
    }

    /// Drop the current timeline
    pub fn clear(&self) {
        self.inner.current.store(None);
    }

    /// One atomic read of the current timeline
    pub fn load(&self) -> Option<Arc<BoundTimeline>> {
        self.inner.current.load_full()
    }

    /// Generation of the current timeline, if any
    pub fn generation(&self) -> Option<u64> {
        self.load().map(|bound| bound.generation)
    }
}
