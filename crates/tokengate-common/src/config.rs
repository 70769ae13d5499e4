//! Tokengate configuration
//!
//! Everything is read from the environment once at startup (an optional `.env`
//! file is loaded first). Missing or malformed required values fail startup.

use std::time::Duration;

use ed25519_dalek::VerifyingKey;

use crate::error::ConfigError;
use crate::types::account_address::AccountAddress;
use crate::types::snowflake::{ApplicationId, GuildId, RoleId};

/// Default Discord REST base
pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Default bound on any single outbound HTTP call, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default depth of the verification job queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Credentials and endpoint for the Discord REST API
#[derive(Clone)]
pub struct DiscordSettings {
    /// Bot token
    pub token: String,
    /// Application (client) id
    pub application_id: ApplicationId,
    /// Guild the command is registered in
    pub guild_id: GuildId,
    /// REST base URL
    pub api_base: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for DiscordSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSettings")
            .field("token", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("guild_id", &self.guild_id)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DiscordSettings {
    fn from_lookup<F>(get: &F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            token: required(get, "DISCORD_TOKEN")?,
            application_id: parse_required(get, "CLIENT_ID")?,
            guild_id: parse_required(get, "GUILD_ID")?,
            api_base: get("DISCORD_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string()),
            timeout: timeout_secs(get, "DISCORD_TIMEOUT_SECS")?,
        })
    }
}

/// EVM node and asset contract
#[derive(Clone)]
pub struct ChainSettings {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// ERC-721 contract queried for balances
    pub contract: AccountAddress,
    /// Per-call timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ChainSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSettings")
            .field("rpc_url", &redact_url(&self.rpc_url))
            .field("contract", &self.contract)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Scheme and host only; provider paths, queries and userinfo often carry API keys
fn redact_url(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    if authority.len() < rest.len() || host.len() < authority.len() {
        format!("{}://{}/<redacted>", scheme, host)
    } else {
        format!("{}://{}", scheme, host)
    }
}

impl ChainSettings {
    fn from_lookup<F>(get: &F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = required(get, "RPC_URL")?;
        if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "RPC_URL",
                reason: "must be an http(s) URL".to_string(),
            });
        }

        let contract = AccountAddress::parse(&required(get, "NFT_CONTRACT_ADDRESS")?).map_err(
            |e| ConfigError::Invalid {
                name: "NFT_CONTRACT_ADDRESS",
                reason: e.to_string(),
            },
        )?;

        Ok(Self {
            rpc_url,
            contract,
            timeout: timeout_secs(get, "RPC_TIMEOUT_SECS")?,
        })
    }
}

/// Interactions endpoint listener
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Pending verification jobs before new ones are refused
    pub queue_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Full configuration of the long-running bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord: DiscordSettings,
    /// Key Discord signs interaction payloads with
    pub public_key: VerifyingKey,
    pub chain: ChainSettings,
    /// Role granted to verified holders
    pub role_id: RoleId,
    pub server: ServerSettings,
}

impl BotConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(get: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord = DiscordSettings::from_lookup(&get)?;
        let public_key = parse_public_key(&required(&get, "DISCORD_PUBLIC_KEY")?)?;
        let chain = ChainSettings::from_lookup(&get)?;
        let role_id = parse_required(&get, "ROLE_ID")?;

        let mut server = ServerSettings::default();
        if let Some(host) = get("HOST") {
            server.host = host;
        }
        if let Some(port) = parse_optional(&get, "PORT")? {
            server.port = port;
        }
        if let Some(capacity) = parse_optional::<usize, _>(&get, "QUEUE_CAPACITY")? {
            if capacity == 0 {
                return Err(ConfigError::Invalid {
                    name: "QUEUE_CAPACITY",
                    reason: "must be at least 1".to_string(),
                });
            }
            server.queue_capacity = capacity;
        }

        Ok(Self {
            discord,
            public_key,
            chain,
            role_id,
            server,
        })
    }
}

/// Configuration of the one-shot command registration utility
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub discord: DiscordSettings,
}

impl RegistrationConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(get: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            discord: DiscordSettings::from_lookup(&get)?,
        })
    }
}

fn required<F>(get: &F, name: &'static str) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_required<T, F>(get: &F, name: &'static str) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    required(get, name)?
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
}

fn parse_optional<T, F>(get: &F, name: &'static str) -> ConfigResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

fn timeout_secs<F>(get: &F, name: &'static str) -> ConfigResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_optional::<u64, _>(get, name)?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "timeout must be at least one second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_public_key(raw: &str) -> ConfigResult<VerifyingKey> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "DISCORD_PUBLIC_KEY",
        reason,
    };
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(raw, &mut bytes).map_err(|e| invalid(e.to_string()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| invalid(e.to_string()))
}
