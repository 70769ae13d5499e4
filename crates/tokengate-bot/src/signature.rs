//! Interaction request signatures
//!
//! Discord signs `timestamp || body` with the application's Ed25519 key and
//! sends the signature hex-encoded in `X-Signature-Ed25519`.

use ed25519_dalek::{Signature, VerifyingKey, SIGNATURE_LENGTH};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("signature is not 64 hex-encoded bytes")]
    Malformed,

    #[error("signature does not match")]
    Mismatch,
}

/// Checks interaction payloads against the application public key
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    pub fn verify(
        &self,
        signature_hex: &str,
        timestamp: &str,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        let mut raw = [0u8; SIGNATURE_LENGTH];
        hex::decode_to_slice(signature_hex.trim(), &mut raw)
            .map_err(|_| SignatureError::Malformed)?;
        let signature = Signature::from_bytes(&raw);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify_strict(&message, &signature)
            .map_err(|_| SignatureError::Mismatch)
    }
}
