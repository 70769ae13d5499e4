//! Verification handler
//!
//! One `verify` invocation, start to finish:
//! 1. Guild context check
//! 2. Address validation
//! 3. Ownership query (the only ledger call)
//! 4. Role resolution
//! 5. Bot permission check (guild-level, from the bot's roles)
//! 6. Role grant
//!
//! Every path ends in exactly one [`VerificationResponse`]. Nothing is retried
//! and nothing is carried over between invocations.

use std::sync::Arc;

use tokengate_common::{
    AccountAddress, GuildId, InputError, PlatformError, RoleGrantOutcome, RoleId, UserId,
};
use tokengate_oracle::OwnershipOracle;
use tracing::{debug, error, info, instrument, warn};

use crate::platform::{guild_permissions, GuildPlatform};

/// Guild the command was invoked in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuildContext {
    pub guild_id: GuildId,
}

/// One inbound `verify` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub invoking_user_id: UserId,
    /// `None` when invoked outside a guild (e.g. in a DM)
    pub guild: Option<GuildContext>,
    /// Untrusted `address` option as typed by the user
    pub raw_address: String,
}

/// Terminal states of a verification, each with fixed user-facing text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResponse {
    NotInGuild,
    InvalidAddress,
    VerificationError,
    NoOwnership,
    RoleMisconfigured,
    InsufficientBotPermission,
    VerificationSuccess,
}

impl VerificationResponse {
    /// Text shown to the invoking user
    pub fn message(self) -> &'static str {
        match self {
            VerificationResponse::NotInGuild => "❌ This command can only be used in a server.",
            VerificationResponse::InvalidAddress => "❌ Invalid wallet address.",
            VerificationResponse::VerificationError => "⚠️ Error verifying NFT ownership.",
            VerificationResponse::NoOwnership => "❌ You don't own any NFTs from this collection.",
            VerificationResponse::RoleMisconfigured => {
                "⚠️ Role not found. Please check ROLE_ID in .env"
            }
            VerificationResponse::InsufficientBotPermission => {
                "⚠️ I don't have permission to manage roles."
            }
            VerificationResponse::VerificationSuccess => {
                "✅ Verification successful! Role granted."
            }
        }
    }

    pub fn is_success(self) -> bool {
        self == VerificationResponse::VerificationSuccess
    }
}

impl std::fmt::Display for VerificationResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Runs the verification handshake against an oracle and a guild platform
pub struct VerificationHandler {
    oracle: Arc<dyn OwnershipOracle>,
    platform: Arc<dyn GuildPlatform>,
    role_id: RoleId,
}

impl VerificationHandler {
    /// Create a handler that grants `role_id` to verified holders
    pub fn new(
        oracle: Arc<dyn OwnershipOracle>,
        platform: Arc<dyn GuildPlatform>,
        role_id: RoleId,
    ) -> Self {
        Self {
            oracle,
            platform,
            role_id,
        }
    }

    /// Handle one invocation
    #[instrument(skip(self, request), fields(user = %request.invoking_user_id))]
    pub async fn handle(&self, request: VerificationRequest) -> VerificationResponse {
        let guild = match request.guild.ok_or(InputError::MissingGuildContext) {
            Ok(guild) => guild,
            Err(e) => {
                debug!(error = %e, "rejected invocation");
                return VerificationResponse::NotInGuild;
            }
        };

        let address = match AccountAddress::parse(&request.raw_address) {
            Ok(address) => address,
            Err(e) => {
                debug!(error = %e, "rejected address input");
                return VerificationResponse::InvalidAddress;
            }
        };

        let ownership = match self.oracle.query_ownership(&address).await {
            Ok(ownership) => ownership,
            Err(e) => {
                error!(%address, error = %e, "ownership query failed");
                return VerificationResponse::VerificationError;
            }
        };

        if !ownership.is_owner() {
            info!(%address, "address holds no tokens");
            return VerificationResponse::NoOwnership;
        }

        match self.assign_role(&guild, request.invoking_user_id).await {
            Ok(RoleGrantOutcome::Granted) => {
                info!(
                    %address,
                    balance = %ownership.owned_unit_count(),
                    guild = %guild.guild_id,
                    role = %self.role_id,
                    "role granted"
                );
                VerificationResponse::VerificationSuccess
            }
            Ok(RoleGrantOutcome::RoleMissing) => {
                warn!(guild = %guild.guild_id, role = %self.role_id, "configured role not found in guild");
                VerificationResponse::RoleMisconfigured
            }
            Ok(RoleGrantOutcome::InsufficientPermission) => {
                warn!(guild = %guild.guild_id, "bot lacks MANAGE_ROLES in the guild");
                VerificationResponse::InsufficientBotPermission
            }
            Err(e) => {
                error!(guild = %guild.guild_id, role = %self.role_id, error = %e, "role assignment failed");
                VerificationResponse::VerificationError
            }
        }
    }

    /// Resolve the role, check permission, then grant it. At most one mutation.
    async fn assign_role(
        &self,
        guild: &GuildContext,
        user_id: UserId,
    ) -> Result<RoleGrantOutcome, PlatformError> {
        let roles = self.platform.guild_roles(guild.guild_id).await?;
        if !roles.iter().any(|role| role.id == self.role_id) {
            return Ok(RoleGrantOutcome::RoleMissing);
        }

        let bot_roles = self.platform.current_member_roles(guild.guild_id).await?;
        let permissions = guild_permissions(guild.guild_id, &roles, &bot_roles);
        debug!(permissions = permissions.bits(), "bot guild permissions");
        if !permissions.can_manage_roles() {
            return Ok(RoleGrantOutcome::InsufficientPermission);
        }

        self.platform
            .add_member_role(guild.guild_id, user_id, self.role_id)
            .await?;
        Ok(RoleGrantOutcome::Granted)
    }
}
