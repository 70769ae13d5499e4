//! Core data types for Tokengate

pub mod account_address;
pub mod ownership;
pub mod permissions;
pub mod snowflake;
