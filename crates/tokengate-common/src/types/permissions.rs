//! Guild permission bitset and role-grant outcomes

use serde::{de, Deserialize, Deserializer};

/// Discord permission bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions(u64);

impl Permissions {
    pub const ADMINISTRATOR: Permissions = Permissions(1 << 3);
    pub const MANAGE_ROLES: Permissions = Permissions(1 << 28);

    pub const fn empty() -> Self {
        Permissions(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Permissions(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Parse the decimal string Discord sends for role permissions
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().map(Permissions)
    }

    /// True if every bit of `other` is set, or the set carries ADMINISTRATOR
    pub fn has(self, other: Permissions) -> bool {
        self.0 & Self::ADMINISTRATOR.0 != 0 || self.0 & other.0 == other.0
    }

    /// Whether the holder may add roles to members
    pub fn can_manage_roles(self) -> bool {
        self.has(Self::MANAGE_ROLES)
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

/// Discord serializes permission bitsets as decimal strings
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Permissions::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid permission bitset: {:?}", raw)))
    }
}

/// Terminal outcome of a role assignment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGrantOutcome {
    /// Role added to the member
    Granted,
    /// Configured role does not exist in the guild
    RoleMissing,
    /// Bot may not manage roles in the guild
    InsufficientPermission,
}
