//! Avatar Kiosk - Talking 3D assistant
//!
//! Loads the configuration, starts the utterance worker against the chat
//! and speech backend, greets the visitor and opens the avatar window.

#![warn(missing_docs)]

mod config;
mod input;
mod logging_setup;

use anyhow::{Context, Result};
use bevy::prelude::*;
use config::KioskConfig;
use kiosk_bevy::AvatarPlugin;
use kiosk_control::{BackendClient, UtterancePipeline, UtteranceRequest, UtteranceWorker};
use kiosk_core::AvatarSession;
use tracing::{info, warn};

fn main() -> Result<()> {
    let config_path = config::config_path(
        std::env::args().skip(1),
        std::env::var(config::CONFIG_ENV_VAR).ok(),
    );
    let loaded = KioskConfig::load(&config_path)?;
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    let _log_guard = logging_setup::init(&config.log)?;

    info!("==========================================");
    info!("===     Avatar Kiosk Session Started   ===");
    info!("==========================================");
    if config_found {
        info!("Configuration: {}", config_path.display());
    } else {
        warn!("Config file {} not found, using defaults", config_path.display());
    }

    let session: AvatarSession<Entity> =
        AvatarSession::new(config.animation, config.visemes.clone())
            .context("Failed to create avatar session")?;

    let client = BackendClient::new(&config.backend).context("Failed to create backend client")?;
    info!("Backend: {}", client.base_url());

    let worker = UtteranceWorker::spawn(UtterancePipeline::new(
        client.clone(),
        session.timeline_slot(),
    ))
    .context("Failed to start utterance worker")?;

    if config.welcome.text.trim().is_empty() {
        info!("Welcome greeting disabled");
    } else {
        let audio_path = config.welcome.audio_path.trim();
        worker.submit(UtteranceRequest::Prepared {
            text: config.welcome.text.clone(),
            audio_url: (!audio_path.is_empty()).then(|| audio_path.to_string()),
            json_url: config.welcome.cues_path.clone(),
        })?;
    }

    input::spawn_stdin_reader(worker.sender()?).context("Failed to start input thread")?;

    let exit = App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Avatar Kiosk".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(AvatarPlugin::new(session, config.avatar.clone()).with_events(worker.events()))
        .run();

    info!("Avatar Kiosk exiting ({:?})", exit);
    Ok(())
}
