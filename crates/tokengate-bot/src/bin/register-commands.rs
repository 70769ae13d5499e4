//! One-shot registration of the `/verify` command in the configured guild
//!
//! Overwrites the guild's command set, so running it again is harmless.

use anyhow::Result;
use tokengate_bot::{discord::verify_command, telemetry, DiscordClient};
use tokengate_common::config::RegistrationConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = RegistrationConfig::load()?;
    let client = DiscordClient::new(&config.discord)?;

    info!(guild = %config.discord.guild_id, "Registering slash commands...");
    let registered = client
        .register_guild_commands(config.discord.guild_id, &[verify_command()])
        .await?;

    for command in &registered {
        info!(id = %command.id, name = %command.name, "registered command");
    }
    info!("Slash commands registered");

    Ok(())
}
