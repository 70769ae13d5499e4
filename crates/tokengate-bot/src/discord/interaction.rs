//! Interaction payloads exchanged with Discord's HTTP interactions endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokengate_common::{GuildId, UserId, ADDRESS_OPTION};

use crate::handler::{GuildContext, VerificationRequest};

/// Message flag making a reply visible only to the invoker
pub const EPHEMERAL: u64 = 1 << 6;

/// Inbound interaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    Other(u8),
}

impl From<u8> for InteractionType {
    fn from(raw: u8) -> Self {
        match raw {
            1 => InteractionType::Ping,
            2 => InteractionType::ApplicationCommand,
            other => InteractionType::Other(other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

/// Inbound interaction (the fields the bot reads)
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub data: Option<CommandData>,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    /// Present for guild invocations
    #[serde(default)]
    pub member: Option<Member>,
    /// Present for DM invocations
    #[serde(default)]
    pub user: Option<User>,
}

impl Interaction {
    /// Command name, if this is a command
    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.name.as_str())
    }

    /// User who triggered the interaction, in a guild or a DM
    pub fn invoking_user(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }

    /// String value of a top-level command option
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|opt| opt.name == name)?
            .value
            .as_ref()?
            .as_str()
    }

    /// Build the handler input for a `verify` command
    ///
    /// Returns `None` when the payload names no invoking user.
    pub fn to_verification_request(&self) -> Option<VerificationRequest> {
        let user = self.invoking_user()?;
        let guild = self.guild_id.map(|guild_id| GuildContext { guild_id });

        Some(VerificationRequest {
            invoking_user_id: user.id,
            guild,
            raw_address: self.option_str(ADDRESS_OPTION).unwrap_or_default().to_string(),
        })
    }
}

/// Message body used both in immediate replies and in follow-up edits
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl MessageData {
    /// Plain content, for editing an already-ephemeral deferred reply
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            flags: None,
        }
    }
}

/// Synchronous reply to an interaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,
}

impl InteractionResponse {
    const PONG: u8 = 1;
    const CHANNEL_MESSAGE: u8 = 4;
    const DEFERRED_CHANNEL_MESSAGE: u8 = 5;

    pub fn pong() -> Self {
        Self {
            kind: Self::PONG,
            data: None,
        }
    }

    /// Ephemeral message shown right away
    pub fn ephemeral_message(content: impl Into<String>) -> Self {
        Self {
            kind: Self::CHANNEL_MESSAGE,
            data: Some(MessageData {
                content: Some(content.into()),
                flags: Some(EPHEMERAL),
            }),
        }
    }

    /// "Bot is thinking..." visible only to the invoker; filled in later
    pub fn deferred_ephemeral() -> Self {
        Self {
            kind: Self::DEFERRED_CHANNEL_MESSAGE,
            data: Some(MessageData {
                content: None,
                flags: Some(EPHEMERAL),
            }),
        }
    }
}
