//! Chat platform capabilities the verification flow depends on

use async_trait::async_trait;
use serde::Deserialize;
use tokengate_common::{GuildId, Permissions, PlatformError, RoleId, UserId};

use crate::handler::VerificationResponse;

/// A role as listed by the guild
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuildRole {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub permissions: Permissions,
}

/// Guild-level permissions of a member holding `member_roles`
///
/// `@everyone` shares the guild's id and always applies. Channel overwrites
/// play no part in managing member roles.
pub fn guild_permissions(
    guild_id: GuildId,
    roles: &[GuildRole],
    member_roles: &[RoleId],
) -> Permissions {
    roles
        .iter()
        .filter(|role| role.id.get() == guild_id.get() || member_roles.contains(&role.id))
        .fold(Permissions::empty(), |acc, role| acc | role.permissions)
}

/// Guild role operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuildPlatform: Send + Sync {
    /// Roles defined in the guild
    async fn guild_roles(&self, guild_id: GuildId) -> Result<Vec<GuildRole>, PlatformError>;

    /// Roles held by the bot's own member in the guild
    async fn current_member_roles(&self, guild_id: GuildId) -> Result<Vec<RoleId>, PlatformError>;

    /// Add `role_id` to the member `user_id`
    async fn add_member_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), PlatformError>;
}

/// Delivers the final response of a deferred interaction
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn deliver(
        &self,
        token: &InteractionToken,
        response: VerificationResponse,
    ) -> Result<(), PlatformError>;
}

/// Per-interaction token used to follow up on a deferred response
///
/// It grants write access to the interaction's messages, so it never shows up
/// in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct InteractionToken(String);

impl InteractionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for InteractionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InteractionToken(<redacted>)")
    }
}
