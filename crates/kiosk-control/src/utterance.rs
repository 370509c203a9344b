//! Utterance worker - fetches speech off the render thread
//!
//! Requests arrive over a crossbeam channel from the input side. Each one is
//! resolved against the backend on a dedicated tokio runtime: the cue
//! document and the encoded audio are downloaded, the timeline is published
//! into the session's [`TimelineSlot`] with one atomic swap, and the render
//! thread receives the audio via [`UtteranceEvent`] so it can start playback.

use crate::client::BackendClient;
use crate::error::{ControlError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use kiosk_core::{CueTimeline, TimelineSlot};
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// What to do once an utterance has finished playing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostSpeech {
    /// Page to open
    pub action_url: Option<String>,
    /// Map location to highlight
    pub map_target: Option<String>,
}

impl PostSpeech {
    /// Whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.action_url.is_none() && self.map_target.is_none()
    }
}

/// A line of speech, ready to play
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Caption text
    pub text: String,
    /// Audio file location, when the backend rendered one
    pub audio_url: Option<String>,
    /// Encoded audio downloaded from `audio_url`; `None` plays silently
    pub audio: Option<Vec<u8>>,
    /// Mouth cues driving the avatar
    pub timeline: CueTimeline,
    /// Slot generation the timeline was published under
    pub generation: u64,
    /// Follow-up actions
    pub post_speech: PostSpeech,
}

/// Work item for the utterance worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceRequest {
    /// Visitor question: chat, then speak the reply
    Ask(String),
    /// Speak a known line directly
    Speak(String, PostSpeech),
    /// Play pre-rendered speech
    Prepared {
        /// Caption text
        text: String,
        /// Audio file location, if the line has sound
        audio_url: Option<String>,
        /// Cue document location
        json_url: String,
    },
}

impl UtteranceRequest {
    /// Text carried by the request
    pub fn text(&self) -> &str {
        match self {
            Self::Ask(text) | Self::Speak(text, _) => text,
            Self::Prepared { text, .. } => text,
        }
    }
}

/// Notification for the render thread
#[derive(Debug, Clone, PartialEq)]
pub enum UtteranceEvent {
    /// Timeline published; start playback
    Started(Utterance),
    /// Request could not be completed
    Failed {
        /// Request text
        text: String,
        /// Error description
        reason: String,
    },
}

/// Resolves requests into published utterances
#[derive(Debug, Clone)]
pub struct UtterancePipeline {
    client: BackendClient,
    slot: TimelineSlot,
}

impl UtterancePipeline {
    /// Create a pipeline publishing into `slot`
    pub fn new(client: BackendClient, slot: TimelineSlot) -> Self {
        Self { client, slot }
    }

    /// Resolve one request.
    ///
    /// Returns `Ok(None)` when there is nothing to say: blank input, or a
    /// chat reply with no text.
    pub async fn handle(&self, request: UtteranceRequest) -> Result<Option<Utterance>> {
        if request.text().trim().is_empty() {
            debug!("Ignoring blank utterance request");
            return Ok(None);
        }

        match request {
            UtteranceRequest::Ask(question) => {
                let reply = self.client.chat(question.trim()).await?;
                if reply.reply.trim().is_empty() {
                    debug!("Backend returned an empty reply");
                    return Ok(None);
                }
                let post_speech = PostSpeech {
                    action_url: reply.action_url,
                    map_target: reply.map_target,
                };
                self.speak(reply.reply, post_speech).await.map(Some)
            }
            UtteranceRequest::Speak(text, post_speech) => {
                self.speak(text, post_speech).await.map(Some)
            }
            UtteranceRequest::Prepared {
                text,
                audio_url,
                json_url,
            } => self
                .load(text, audio_url, &json_url, PostSpeech::default())
                .await
                .map(Some),
        }
    }

    async fn speak(&self, text: String, post_speech: PostSpeech) -> Result<Utterance> {
        let asset = self.client.synthesize(&text).await?;
        self.load(text, Some(asset.audio_url), &asset.json_url, post_speech)
            .await
    }

    /// Download cues and audio together, then publish the cues
    async fn load(
        &self,
        text: String,
        audio_url: Option<String>,
        json_url: &str,
        post_speech: PostSpeech,
    ) -> Result<Utterance> {
        let (timeline, audio) = tokio::join!(
            self.client.fetch_timeline(json_url),
            self.fetch_audio(audio_url.as_deref())
        );
        let timeline = timeline?;

        let generation = self.slot.publish(timeline.clone());
        info!(
            "Utterance ready: {} cues, {:.2}s, {} (generation {})",
            timeline.len(),
            timeline.end_time(),
            audio
                .as_ref()
                .map(|bytes| format!("{} bytes of audio", bytes.len()))
                .unwrap_or_else(|| "no audio".to_string()),
            generation
        );
        Ok(Utterance {
            text,
            audio_url,
            audio,
            timeline,
            generation,
            post_speech,
        })
    }

    /// Missing audio degrades to silent lip-sync instead of failing the line
    async fn fetch_audio(&self, audio_url: Option<&str>) -> Option<Vec<u8>> {
        let url = audio_url?;
        match self.client.fetch_audio(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Audio unavailable ({}): {}", url, e);
                None
            }
        }
    }
}

/// Background thread running an [`UtterancePipeline`]
#[derive(Debug)]
pub struct UtteranceWorker {
    requests: Option<Sender<UtteranceRequest>>,
    events: Receiver<UtteranceEvent>,
    thread: Option<JoinHandle<()>>,
}

impl UtteranceWorker {
    /// Spawn the worker thread and its runtime
    pub fn spawn(pipeline: UtterancePipeline) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<UtteranceRequest>();
        let (event_tx, event_rx) = unbounded();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let thread = thread::Builder::new()
            .name("utterance-worker".to_string())
            .spawn(move || {
                info!("Utterance worker started");

                // Requests are handled one at a time; a newer one simply replaces the slot
                while let Ok(request) = request_rx.recv() {
                    let text = request.text().to_string();
                    let event = match runtime.block_on(pipeline.handle(request)) {
                        Ok(Some(utterance)) => UtteranceEvent::Started(utterance),
                        Ok(None) => continue,
                        Err(e) => {
                            warn!("Utterance failed: {}", e);
                            UtteranceEvent::Failed {
                                text,
                                reason: e.to_string(),
                            }
                        }
                    };
                    if event_tx.send(event).is_err() {
                        debug!("Event receiver dropped");
                        break;
                    }
                }

                info!("Utterance worker stopped");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            events: event_rx,
            thread: Some(thread),
        })
    }

    /// Cloneable request handle for input sources
    pub fn sender(&self) -> Result<Sender<UtteranceRequest>> {
        self.requests.clone().ok_or(ControlError::ChannelClosed)
    }

    /// Queue a request; blank text is dropped here already
    pub fn submit(&self, request: UtteranceRequest) -> Result<()> {
        if request.text().trim().is_empty() {
            return Ok(());
        }
        self.requests
            .as_ref()
            .ok_or(ControlError::ChannelClosed)?
            .send(request)
            .map_err(|_| ControlError::ChannelClosed)
    }

    /// Receiver for the render thread
    pub fn events(&self) -> Receiver<UtteranceEvent> {
        self.events.clone()
    }

    /// Close the request channel and wait for in-flight work.
    ///
    /// Other senders obtained via [`UtteranceWorker::sender`] keep the
    /// thread alive until they are dropped too.
    pub fn shutdown(mut self) {
        self.requests = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Utterance worker panicked");
            }
        }
    }
}
