//! Slash command definitions

use serde::{Deserialize, Serialize};
use tokengate_common::{ADDRESS_OPTION, VERIFY_COMMAND};

/// `CHAT_INPUT` application command type
pub const CHAT_INPUT: u8 = 1;

/// `STRING` option type
pub const STRING_OPTION: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOptionDefinition {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDefinition {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<CommandOptionDefinition>,
}

/// Command as echoed back by Discord after registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredCommand {
    pub id: String,
    pub name: String,
}

/// `/verify address:<wallet>`
pub fn verify_command() -> CommandDefinition {
    CommandDefinition {
        kind: CHAT_INPUT,
        name: VERIFY_COMMAND.to_string(),
        description: "Verify your wallet holds an NFT from the collection".to_string(),
        options: vec![CommandOptionDefinition {
            kind: STRING_OPTION,
            name: ADDRESS_OPTION.to_string(),
            description: "Your wallet address".to_string(),
            required: true,
        }],
    }
}
