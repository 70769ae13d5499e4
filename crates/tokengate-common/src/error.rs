//! Error types for Tokengate
//!
//! One enum per concern. Runtime errors stop at the verification handler and
//! become a single user-facing response; configuration errors are fatal.

use thiserror::Error;

/// Errors caused by what the invoking user sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid account address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Command was not invoked inside a guild")]
    MissingGuildContext,
}

/// Ownership oracle failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Node could not be reached, timed out, or answered with a non-success status
    #[error("RPC node unreachable: {0}")]
    Unreachable(String),

    /// Node answered but the call reverted or returned something undecodable
    #[error("Contract call failed: {0}")]
    ContractError(String),
}

/// Chat platform REST failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("Platform API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Platform request timed out")]
    Timeout,

    #[error("Platform transport error: {0}")]
    Transport(String),

    #[error("Unexpected platform payload: {0}")]
    Decode(String),
}

/// Startup configuration errors. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
