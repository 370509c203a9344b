//! Viseme-to-Channel Mapping
//!
//! Static tables that translate a viseme symbol into the face blend-shape
//! channel it drives and the jaw-opening intensity used for the teeth.
//! The table is plain configuration data so a different rig or viseme
//! vocabulary can be swapped in without touching the sampler.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mouth shapes emitted by the lip-sync analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Viseme {
    /// Closed mouth for P, B, M
    A,
    /// Slightly open mouth with clenched teeth (K, S, T, ...)
    B,
    /// Open mouth (EH, AE)
    C,
    /// Wide open mouth (AA)
    D,
    /// Slightly rounded mouth (AO, ER)
    E,
    /// Puckered lips (UW, OW, W)
    F,
    /// Upper teeth touching the lower lip (F, V)
    G,
    /// Tongue raised behind the upper teeth (L)
    H,
    /// Idle / rest position
    X,
}

impl Viseme {
    /// All visemes in table order
    pub const ALL: [Viseme; 9] = [
        Viseme::A,
        Viseme::B,
        Viseme::C,
        Viseme::D,
        Viseme::E,
        Viseme::F,
        Viseme::G,
        Viseme::H,
        Viseme::X,
    ];

    /// Parse a symbol; unknown symbols yield `None`
    pub fn parse(symbol: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|viseme| viseme.symbol() == symbol)
    }

    /// Wire symbol for this viseme
    pub fn symbol(&self) -> &'static str {
        match self {
            Viseme::A => "A",
            Viseme::B => "B",
            Viseme::C => "C",
            Viseme::D => "D",
            Viseme::E => "E",
            Viseme::F => "F",
            Viseme::G => "G",
            Viseme::H => "H",
            Viseme::X => "X",
        }
    }
}

/// Resolved mapping entry: which channel to drive and how hard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisemeTarget {
    /// Blend-shape channel name on the face mesh
    pub channel: String,
    /// Jaw-opening intensity in `[0, 1]`
    pub intensity: f32,
}

impl VisemeTarget {
    /// Create a new mapping entry
    pub fn new(channel: impl Into<String>, intensity: f32) -> Self {
        Self {
            channel: channel.into(),
            intensity,
        }
    }
}

/// Symbol -> (channel, intensity) table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisemeMap {
    /// Channel used for silence and unknown symbols
    pub silence_channel: String,
    /// Entries keyed by viseme symbol
    pub entries: BTreeMap<String, VisemeTarget>,
}

impl Default for VisemeMap {
    /// Table for the stock Ready Player Me face rig
    fn default() -> Self {
        let table = [
            (Viseme::A, "viseme_PP", 0.0),
            (Viseme::B, "viseme_kk", 0.3),
            (Viseme::C, "viseme_I", 0.4),
            (Viseme::D, "viseme_aa", 1.0),
            (Viseme::E, "viseme_O", 0.6),
            (Viseme::F, "viseme_U", 0.3),
            (Viseme::G, "viseme_FF", 0.1),
            (Viseme::H, "viseme_nn", 0.3),
            (Viseme::X, "viseme_sil", 0.0),
        ];

        Self {
            silence_channel: "viseme_sil".to_string(),
            entries: table
                .into_iter()
                .map(|(viseme, channel, intensity)| {
                    (
                        viseme.symbol().to_string(),
                        VisemeTarget::new(channel, intensity),
                    )
                })
                .collect(),
        }
    }
}

impl VisemeMap {
    /// Create an empty table; every symbol resolves to silence
    pub fn new(silence_channel: impl Into<String>) -> Self {
        Self {
            silence_channel: silence_channel.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace an entry
    pub fn with_entry(
        mut self,
        symbol: impl Into<String>,
        channel: impl Into<String>,
        intensity: f32,
    ) -> Self {
        self.entries
            .insert(symbol.into(), VisemeTarget::new(channel, intensity));
        self
    }

    /// The silence mapping
    pub fn silence(&self) -> VisemeTarget {
        VisemeTarget::new(self.silence_channel.clone(), 0.0)
    }

    /// Resolve a symbol. Missing or unknown symbols map to silence.
    pub fn resolve(&self, symbol: Option<&str>) -> VisemeTarget {
        match symbol.and_then(|s| self.entries.get(s)) {
            Some(entry) => VisemeTarget::new(entry.channel.clone(), clamp_intensity(entry.intensity)),
            None => self.silence(),
        }
    }

    /// Face channel codomain: distinct channel names, silence channel last
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = Vec::with_capacity(self.entries.len() + 1);
        for entry in self.entries.values() {
            if entry.channel != self.silence_channel && !channels.contains(&entry.channel) {
                channels.push(entry.channel.clone());
            }
        }
        channels.push(self.silence_channel.clone());
        channels
    }

    /// Validate the table
    pub fn validate(&self) -> Result<()> {
        if self.silence_channel.is_empty() {
            return Err(CoreError::Config(
                "viseme silence channel must not be empty".to_string(),
            ));
        }
        for (symbol, entry) in &self.entries {
            if entry.channel.is_empty() {
                return Err(CoreError::Config(format!(
                    "viseme '{}' maps to an empty channel name",
                    symbol
                )));
            }
            if !entry.intensity.is_finite() {
                return Err(CoreError::Config(format!(
                    "viseme '{}' has a non-finite intensity",
                    symbol
                )));
            }
        }
        Ok(())
    }
}

fn clamp_intensity(intensity: f32) -> f32 {
    if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
