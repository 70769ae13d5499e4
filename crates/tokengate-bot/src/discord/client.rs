//! Discord REST client
//!
//! Covers the endpoints the bot touches: guild role listing, the bot's own
//! member record, member role grants, deferred-response edits, and guild
//! command registration.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokengate_common::{
    config::DiscordSettings, ApplicationId, GuildId, PlatformError, RoleId, UserId, VERSION,
};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use super::commands::{CommandDefinition, RegisteredCommand};
use super::interaction::MessageData;
use crate::handler::VerificationResponse;
use crate::platform::{GuildPlatform, GuildRole, InteractionToken, ResponseSink};

/// Audit log entry attached to role grants
const GRANT_AUDIT_REASON: &str = "Verified NFT holder";

/// Longest API error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct CurrentUser {
    id: UserId,
}

#[derive(Debug, Deserialize)]
struct MemberRoles {
    #[serde(default)]
    roles: Vec<RoleId>,
}

/// Authenticated Discord REST client
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    application_id: ApplicationId,
    /// Resolved on first use from `/users/@me`
    bot_user: OnceCell<UserId>,
}

impl DiscordClient {
    /// Create a client from Discord settings
    pub fn new(settings: &DiscordSettings) -> Result<Self, PlatformError> {
        let mut auth = HeaderValue::from_str(&format!("Bot {}", settings.token)).map_err(|_| {
            PlatformError::Transport("bot token contains characters not valid in a header".into())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .user_agent(format!("DiscordBot (tokengate, {})", VERSION))
            .build()
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            application_id: settings.application_id,
            bot_user: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Send a request; non-success statuses become `PlatformError::Api`
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, PlatformError> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut message = response.text().await.unwrap_or_default();
        if message.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        Err(PlatformError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// The bot's own user id
    async fn bot_user_id(&self) -> Result<UserId, PlatformError> {
        self.bot_user
            .get_or_try_init(|| async {
                let response = self.send(self.http.get(self.url("/users/@me"))).await?;
                let user: CurrentUser = decode(response).await?;
                debug!(bot = %user.id, "resolved bot user");
                Ok::<_, PlatformError>(user.id)
            })
            .await
            .copied()
    }

    /// Overwrite the guild's command set (idempotent)
    #[instrument(skip(self, commands), fields(count = commands.len()))]
    pub async fn register_guild_commands(
        &self,
        guild_id: GuildId,
        commands: &[CommandDefinition],
    ) -> Result<Vec<RegisteredCommand>, PlatformError> {
        let url = self.url(&format!(
            "/applications/{}/guilds/{}/commands",
            self.application_id, guild_id
        ));
        let response = self.send(self.http.put(url).json(commands)).await?;
        decode(response).await
    }
}

#[async_trait]
impl GuildPlatform for DiscordClient {
    #[instrument(skip(self))]
    async fn guild_roles(&self, guild_id: GuildId) -> Result<Vec<GuildRole>, PlatformError> {
        let url = self.url(&format!("/guilds/{}/roles", guild_id));
        let response = self.send(self.http.get(url)).await?;
        let roles: Vec<GuildRole> = decode(response).await?;
        debug!(count = roles.len(), "fetched guild roles");
        Ok(roles)
    }

    #[instrument(skip(self))]
    async fn current_member_roles(&self, guild_id: GuildId) -> Result<Vec<RoleId>, PlatformError> {
        let bot = self.bot_user_id().await?;
        let url = self.url(&format!("/guilds/{}/members/{}", guild_id, bot));
        let response = self.send(self.http.get(url)).await?;
        let member: MemberRoles = decode(response).await?;
        Ok(member.roles)
    }

    #[instrument(skip(self))]
    async fn add_member_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), PlatformError> {
        let url = self.url(&format!(
            "/guilds/{}/members/{}/roles/{}",
            guild_id, user_id, role_id
        ));
        self.send(
            self.http
                .put(url)
                .header("X-Audit-Log-Reason", GRANT_AUDIT_REASON)
                .header(CONTENT_LENGTH, "0"),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ResponseSink for DiscordClient {
    #[instrument(skip(self, token))]
    async fn deliver(
        &self,
        token: &InteractionToken,
        response: VerificationResponse,
    ) -> Result<(), PlatformError> {
        let url = self.url(&format!(
            "/webhooks/{}/{}/messages/@original",
            self.application_id,
            token.as_str()
        ));
        self.send(self.http.patch(url).json(&MessageData::content(response.message())))
            .await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PlatformError> {
    response
        .json()
        .await
        .map_err(|e| PlatformError::Decode(e.without_url().to_string()))
}

/// URLs may carry interaction tokens, so they are stripped from errors
fn transport_error(err: reqwest::Error) -> PlatformError {
    if err.is_timeout() {
        PlatformError::Timeout
    } else {
        PlatformError::Transport(err.without_url().to_string())
    }
}
