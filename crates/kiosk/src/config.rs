//! Kiosk configuration file
//!
//! Every section falls back to its defaults, so a missing file or a file
//! containing only `[backend]` both produce a runnable kiosk.

use anyhow::{Context, Result};
use kiosk_bevy::resources::AvatarSettings;
use kiosk_control::BackendConfig;
use kiosk_core::{AnimationConfig, LogConfig, VisemeMap};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "kiosk.toml";

/// Environment variable overriding the configuration path
pub const CONFIG_ENV_VAR: &str = "KIOSK_CONFIG";

/// Startup greeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelcomeConfig {
    /// Caption spoken at startup; empty disables the greeting
    pub text: String,
    /// Pre-rendered greeting audio, relative to the backend root; empty
    /// greets silently
    pub audio_path: String,
    /// Mouth cues for the greeting, relative to the backend root
    pub cues_path: String,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            text: "Hello! I am your Smart Campus Assistant. Ask me about routes, hostels, or schedules."
                .to_string(),
            audio_path: "audio/welcome.mp3".to_string(),
            cues_path: "audio/welcome.json".to_string(),
        }
    }
}

/// Complete kiosk configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Chat and speech backend
    pub backend: BackendConfig,
    /// Avatar asset and stage placement
    pub avatar: AvatarSettings,
    /// Lip-sync tuning
    pub animation: AnimationConfig,
    /// Viseme mapping table for the avatar rig
    pub visemes: VisemeMap,
    /// Logging
    pub log: LogConfig,
    /// Startup greeting
    pub welcome: WelcomeConfig,
}

impl KioskConfig {
    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse kiosk configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`
    ///
    /// Returns `None` when the file does not exist. Logging is not set up yet
    /// at this point, so the caller reports the fallback to defaults.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .map(Some)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Check value ranges of every section
    pub fn validate(&self) -> Result<()> {
        self.animation
            .validate()
            .context("Invalid [animation] section")?;
        self.visemes.validate().context("Invalid [visemes] section")?;
        Ok(())
    }
}

/// Resolve the configuration path: first argument, then environment, then default
pub fn config_path(mut args: impl Iterator<Item = String>, env: Option<String>) -> PathBuf {
    args.next()
        .or(env)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
