//! Main Entrypoint for the Mozart voice client
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and command line.
//! 2. Opening the speaker and building the token client and session adapter.
//! 3. Running the controller task and the terminal front-end until the user quits.
//! 4. Ending any open call before exiting.

use anyhow::Context;
use clap::Parser;
use mozart_client::{
    app::{run_terminal, spawn_controller},
    config::{Args, Config},
    livekit::{LiveKitSdk, SpeakerSink},
};
use mozart_core::{CallController, HttpTokenClient, SessionAdapter};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let args = Args::parse();
    let config = Config::load(&args).context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!(
        backend_url = %config.backend_url,
        agent_id = %config.agent_id,
        livekit_url = %config.livekit_url,
        "Configuration loaded"
    );

    // --- 3. Initialize Shared Services ---
    let speaker = Arc::new(
        SpeakerSink::open()
            .await
            .context("Failed to open the speaker")?,
    );
    let sessions = SessionAdapter::new(Arc::new(LiveKitSdk::new(&config.livekit_url)), speaker);
    let tokens = Arc::new(HttpTokenClient::new(&config.backend_url));
    let controller = CallController::new(&config.agent_id, tokens, sessions);

    // --- 4. Run ---
    let states = controller.subscribe();
    let (commands, controller_task) = spawn_controller(controller);
    run_terminal(
        BufReader::new(tokio::io::stdin()),
        commands,
        states,
        &config.agent_name,
    )
    .await?;

    controller_task
        .await
        .context("Controller task panicked")?;
    info!("Goodbye.");
    Ok(())
}
