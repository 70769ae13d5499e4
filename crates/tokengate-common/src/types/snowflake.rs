//! Discord snowflake identifiers
//!
//! Snowflakes are 64-bit integers that travel as decimal strings in JSON.
//! Each kind of id gets its own newtype so a role id can't be passed where a
//! user id is expected.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map($name)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(SnowflakeVisitor).map($name)
            }
        }
    };
}

snowflake_id!(
    /// Discord user id
    UserId
);
snowflake_id!(
    /// Discord guild (server) id
    GuildId
);
snowflake_id!(
    /// Discord role id
    RoleId
);
snowflake_id!(
    /// Discord application id
    ApplicationId
);

struct SnowflakeVisitor;

impl<'de> de::Visitor<'de> for SnowflakeVisitor {
    type Value = u64;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a snowflake as a decimal string or integer")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<u64, E> {
        value
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("invalid snowflake: {}", value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<u64, E> {
        Ok(value)
    }
}
