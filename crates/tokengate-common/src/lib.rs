//! # Tokengate Common
//!
//! Shared types, errors, and configuration for the Tokengate holder-verification bot.
//!
//! ## Core Types
//!
//! - [`AccountAddress`]: validated EVM account address (EIP-55 aware)
//! - [`OwnershipResult`]: asset balance reported by the ownership oracle
//! - [`Permissions`]/[`RoleGrantOutcome`]: guild permission bits and role-grant results
//! - [`UserId`], [`GuildId`], [`RoleId`], [`ApplicationId`]: Discord snowflakes
//!
//! ## Configuration
//!
//! - [`config::BotConfig`]: everything the long-running bot needs
//! - [`config::RegistrationConfig`]: what the command registration utility needs

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, InputError, OracleError, PlatformError};
pub use types::{
    account_address::AccountAddress,
    ownership::OwnershipResult,
    permissions::{Permissions, RoleGrantOutcome},
    snowflake::{ApplicationId, GuildId, RoleId, UserId},
};

/// Unsigned 256-bit integer used for ledger balances
pub use primitive_types::U256;

/// Tokengate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the slash command users invoke
pub const VERIFY_COMMAND: &str = "verify";

/// Name of the command's address option
pub const ADDRESS_OPTION: &str = "address";
