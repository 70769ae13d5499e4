//! Tokengate Bot Binary
//!
//! Serves Discord's HTTP interactions endpoint and verifies NFT holders.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokengate_bot::{
    server, spawn_dispatcher, telemetry, AppState, DiscordClient, SignatureVerifier,
    VerificationHandler,
};
use tokengate_common::{config::BotConfig, VERSION};
use tokengate_oracle::Erc721Oracle;
use tracing::{error, info, warn};

/// How long in-flight verifications may take to finish on shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    info!("Starting Tokengate v{}", VERSION);

    let config = BotConfig::load().map_err(|e| {
        error!(error = %e, "invalid configuration, refusing to start");
        e
    })?;
    info!("Loaded configuration: {:?}", config);

    let oracle = Arc::new(Erc721Oracle::from_settings(&config.chain)?);
    let discord = Arc::new(DiscordClient::new(&config.discord)?);
    let handler = Arc::new(VerificationHandler::new(
        oracle,
        discord.clone(),
        config.role_id,
    ));

    let (dispatcher, worker) =
        spawn_dispatcher(handler, discord, config.server.queue_capacity);
    let app = server::router(AppState::new(
        SignatureVerifier::new(config.public_key),
        dispatcher,
    ));

    let listener = server::bind(&config.server).await?;
    info!(
        contract = %config.chain.contract,
        role = %config.role_id,
        "Interactions endpoint listening on http://{}/interactions",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Waiting for in-flight verifications");
    match tokio::time::timeout(DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "dispatcher task failed"),
        Err(_) => warn!("gave up waiting for in-flight verifications"),
    }

    info!("Shutting down Tokengate");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
