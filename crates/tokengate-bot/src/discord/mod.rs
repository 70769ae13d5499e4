//! Discord integration: REST client, interaction payloads, command definitions

pub mod client;
pub mod commands;
pub mod interaction;

pub use client::DiscordClient;
pub use commands::{verify_command, CommandDefinition, RegisteredCommand};
pub use interaction::{Interaction, InteractionResponse, InteractionType};
