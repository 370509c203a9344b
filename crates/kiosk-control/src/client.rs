//! Chat and speech backend client
//!
//! The backend exposes two JSON endpoints: `POST /chat` answers a visitor
//! question, `POST /tts-eleven` renders a line of speech and returns the
//! locations of the audio file and its mouth-cue document. Both files are
//! then fetched with plain `GET`s.

use crate::error::{ControlError, Result};
use kiosk_core::CueTimeline;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Root URL of the backend
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Answer to a visitor question
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatReply {
    /// Text for the avatar to speak
    #[serde(default)]
    pub reply: String,
    /// Page to open once the reply has been spoken
    #[serde(default)]
    pub action_url: Option<String>,
    /// Map location to highlight once the reply has been spoken
    #[serde(default)]
    pub map_target: Option<String>,
}

/// Rendered speech: audio plus its mouth-cue document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechAsset {
    /// Audio file location
    pub audio_url: String,
    /// Mouth-cue JSON location
    pub json_url: String,
}

#[derive(Serialize)]
struct TextBody<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SynthesizeResponse {
    Ready(SpeechAsset),
    Failed { error: String },
}

/// HTTP client for the kiosk backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
}

impl BackendClient {
    /// Build a client from configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut base = Url::parse(&config.base_url)
            .map_err(|e| ControlError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        // Joining relative paths needs a directory-style base
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, base })
    }

    /// Backend root
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an absolute URL, or a path relative to the backend root
    pub fn resolve(&self, location: &str) -> Result<Url> {
        match Url::parse(location) {
            Ok(url) => Ok(url),
            Err(_) => self
                .base
                .join(location.trim_start_matches('/'))
                .map_err(|e| ControlError::InvalidUrl(format!("{}: {}", location, e))),
        }
    }

    /// Ask the chat endpoint for a reply
    pub async fn chat(&self, text: &str) -> Result<ChatReply> {
        let url = self.resolve("chat")?;
        debug!("POST {} ({} chars)", url, text.len());

        let resp = self.http.post(url).json(&TextBody { text }).send().await?;
        if !resp.status().is_success() {
            return Err(ControlError::Backend(format!(
                "chat failed: HTTP {}",
                resp.status()
            )));
        }

        Ok(resp.json().await?)
    }

    /// Render `text` to speech
    pub async fn synthesize(&self, text: &str) -> Result<SpeechAsset> {
        let url = self.resolve("tts-eleven")?;
        debug!("POST {} ({} chars)", url, text.len());

        let resp = self.http.post(url).json(&TextBody { text }).send().await?;
        if !resp.status().is_success() {
            return Err(ControlError::Backend(format!(
                "speech synthesis failed: HTTP {}",
                resp.status()
            )));
        }

        let body: SynthesizeResponse = resp.json().await?;
        match body {
            SynthesizeResponse::Ready(asset) => Ok(asset),
            SynthesizeResponse::Failed { error } => Err(ControlError::Backend(error)),
        }
    }

    /// Download and parse a mouth-cue document
    pub async fn fetch_timeline(&self, json_url: &str) -> Result<CueTimeline> {
        let url = self.resolve(json_url)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ControlError::Backend(format!(
                "cue fetch failed: HTTP {}",
                resp.status()
            )));
        }

        let body = resp.text().await?;
        Ok(CueTimeline::from_json(&body)?)
    }

    /// Download an encoded audio file
    pub async fn fetch_audio(&self, audio_url: &str) -> Result<Vec<u8>> {
        let url = self.resolve(audio_url)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ControlError::Backend(format!(
                "audio fetch failed: HTTP {}",
                resp.status()
            )));
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(ControlError::Backend("audio file is empty".to_string()));
        }
        Ok(bytes.to_vec())
    }
}
