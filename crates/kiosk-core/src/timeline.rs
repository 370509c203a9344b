//! Cue Timeline - per-utterance viseme intervals
//!
//! A timeline is the ordered list of mouth cues produced by the external
//! viseme service for one spoken reply. It is immutable once built and is
//! replaced wholesale when the next reply arrives.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Time in seconds on the audio clock
pub type Seconds = f64;

/// A timestamped interval asserting which viseme is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Interval start in seconds
    pub start: Seconds,
    /// Interval end in seconds (inclusive)
    pub end: Seconds,
    /// Raw viseme symbol as delivered by the cue source
    pub value: String,
}

impl Cue {
    /// Create a new cue
    pub fn new(start: Seconds, end: Seconds, value: impl Into<String>) -> Self {
        Self {
            start,
            end,
            value: value.into(),
        }
    }

    /// Check whether `t` lies inside `[start, end]`
    pub fn contains(&self, t: Seconds) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Metadata block of a cue document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CueMetadata {
    #[serde(default)]
    sound_file: Option<String>,
    #[serde(default)]
    duration: Option<Seconds>,
}

/// Wire formats accepted for a cue document
#[derive(Deserialize)]
#[serde(untagged)]
enum CueDocument {
    Bare(Vec<Cue>),
    Full {
        #[serde(default)]
        metadata: Option<CueMetadata>,
        #[serde(rename = "mouthCues")]
        mouth_cues: Vec<Cue>,
    },
}

/// Ordered, immutable sequence of cues for one utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CueTimeline {
    cues: Vec<Cue>,
    duration: Option<Seconds>,
    sound_file: Option<String>,
}

impl CueTimeline {
    /// Build a timeline from in-memory cues
    pub fn from_cues(cues: Vec<Cue>) -> Self {
        Self {
            cues,
            duration: None,
            sound_file: None,
        }
    }

    /// Parse a cue document.
    ///
    /// Accepts either the `{"metadata": {...}, "mouthCues": [...]}` document
    /// written by the lip-sync analyzer or a bare array of cues. Ordering is
    /// not validated here; lookups degrade gracefully on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: CueDocument =
            serde_json::from_str(json).map_err(|e| CoreError::Timeline(e.to_string()))?;

        Ok(match document {
            CueDocument::Bare(cues) => Self::from_cues(cues),
            CueDocument::Full {
                metadata,
                mouth_cues,
            } => {
                let metadata = metadata.unwrap_or_default();
                Self {
                    cues: mouth_cues,
                    duration: metadata.duration.filter(|d| d.is_finite() && *d >= 0.0),
                    sound_file: metadata.sound_file,
                }
            }
        })
    }

    /// Attach an explicit audio duration
    pub fn with_duration(mut self, duration: Seconds) -> Self {
        self.duration = Some(duration);
        self
    }

    /// All cues in sequence order
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the timeline has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Sound file named by the cue document, if any
    pub fn sound_file(&self) -> Option<&str> {
        self.sound_file.as_deref()
    }

    /// Find the cue active at time `t`.
    ///
    /// Linear scan; the first cue in sequence order whose closed interval
    /// contains `t` wins, so overlapping or unsorted input still resolves
    /// deterministically. Returns `None` for silence.
    pub fn active_cue(&self, t: Seconds) -> Option<&Cue> {
        if !t.is_finite() {
            return None;
        }
        self.cues.iter().find(|cue| cue.contains(t))
    }

    /// End of the utterance in seconds.
    ///
    /// The declared audio duration when known, otherwise the latest cue end.
    pub fn end_time(&self) -> Seconds {
        if let Some(duration) = self.duration {
            return duration;
        }
        self.cues
            .iter()
            .map(|cue| cue.end)
            .filter(|end| end.is_finite())
            .fold(0.0, f64::max)
    }

    /// Whether cues are sorted, non-overlapping and each has `start <= end`
    pub fn is_well_formed(&self) -> bool {
        let intervals_valid = self
            .cues
            .iter()
            .all(|cue| cue.start.is_finite() && cue.end.is_finite() && cue.start <= cue.end);

        intervals_valid
            && self
                .cues
                .windows(2)
                .all(|pair| pair[0].start <= pair[1].start && pair[0].end <= pair[1].start)
    }
}
