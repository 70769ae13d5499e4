//! AccountAddress - validated EVM account identifier
//!
//! Accepts the same shapes an EVM wallet hands out:
//! - `0x` followed by exactly 40 hex digits
//! - all-lowercase or all-uppercase bodies without a checksum
//! - mixed-case bodies only when they match the EIP-55 checksum

use primitive_types::H160;
use sha3::{Digest, Keccak256};
use std::str::FromStr;

use crate::error::InputError;

/// Validated 20-byte account address
///
/// There is no way to build one from unchecked text other than [`AccountAddress::parse`],
/// so every value that reaches the ownership oracle is well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountAddress(H160);

impl AccountAddress {
    /// Address length in bytes
    pub const LEN: usize = 20;

    /// Parse and validate user-supplied text
    ///
    /// # Example
    /// ```
    /// use tokengate_common::AccountAddress;
    ///
    /// let addr = AccountAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
    /// assert_eq!(addr.to_checksum(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    /// assert!(AccountAddress::parse("not-an-address").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, InputError> {
        let input = input.trim();
        let body = input
            .strip_prefix("0x")
            .ok_or_else(|| invalid("missing 0x prefix"))?;

        if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("contains non-hex characters"));
        }
        if body.len() != Self::LEN * 2 {
            return Err(invalid(format!(
                "expected {} hex digits, got {}",
                Self::LEN * 2,
                body.len()
            )));
        }

        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(body, &mut bytes).map_err(|e| invalid(e.to_string()))?;

        let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && checksum_encode(&bytes)[2..] != *body {
            return Err(invalid("checksum mismatch"));
        }

        Ok(Self(H160(bytes)))
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        self.0.as_fixed_bytes()
    }

    /// EIP-55 mixed-case representation
    pub fn to_checksum(&self) -> String {
        checksum_encode(self.as_bytes())
    }

    /// Left-pad to a 32-byte ABI word
    pub fn to_abi_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(self.as_bytes());
        word
    }
}

impl FromStr for AccountAddress {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

fn invalid(reason: impl Into<String>) -> InputError {
    InputError::InvalidAddress {
        reason: reason.into(),
    }
}

fn checksum_encode(bytes: &[u8; AccountAddress::LEN]) -> String {
    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
