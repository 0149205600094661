//! Wallet signature recovery.
//!
//! Wallets sign challenge text with the `personal_sign` convention: the
//! message is prefixed with `"\x19Ethereum Signed Message:\n"` and its byte
//! length, hashed with keccak256, and signed with a recoverable secp256k1
//! signature. Recovering the public key and hashing it gives back the
//! signer's address, which the caller compares with the claimed one.

use adapters::Address;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, VerifyOnly};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Preamble of the personal-message hashing scheme.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature is not valid hex")]
    InvalidHex,

    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("unsupported recovery id {0}")]
    InvalidRecoveryId(u8),

    #[error("public key recovery failed: {0}")]
    Recovery(String),
}

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Hash `message` the way `personal_sign` does before signing.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Address controlled by `public_key`: the low 20 bytes of the keccak256 of
/// the uncompressed point without its `0x04` tag.
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let digest = keccak256(&uncompressed[1..]);

    let mut bytes = [0u8; Address::LEN];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

/// Decode a hex signature, with or without a `0x` prefix.
pub fn decode_signature(signature: &str) -> Result<Vec<u8>, SignatureError> {
    let trimmed = signature.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let bytes = hex::decode(digits).map_err(|_| SignatureError::InvalidHex)?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(SignatureError::InvalidLength(bytes.len()));
    }
    Ok(bytes)
}

/// Recovers signer addresses from `personal_sign` signatures.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secp: Secp256k1<VerifyOnly>,
}

impl SignatureVerifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }

    /// Recover the address that signed `message` under the personal-message
    /// scheme. Does not compare against any claimed address.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<Address, SignatureError> {
        if signature.len() != SIGNATURE_LEN {
            return Err(SignatureError::InvalidLength(signature.len()));
        }

        let v = signature[64];
        let recovery_byte = match v {
            0 | 1 => v,
            27 | 28 => v - 27,
            other => return Err(SignatureError::InvalidRecoveryId(other)),
        };
        let recovery_id = RecoveryId::from_i32(i32::from(recovery_byte))
            .map_err(|e| SignatureError::Recovery(e.to_string()))?;

        let recoverable = RecoverableSignature::from_compact(&signature[..64], recovery_id)
            .map_err(|e| SignatureError::Recovery(e.to_string()))?;

        let digest = Message::from_digest(personal_message_hash(message));
        let public_key = self
            .secp
            .recover_ecdsa(&digest, &recoverable)
            .map_err(|e| SignatureError::Recovery(e.to_string()))?;

        Ok(address_from_public_key(&public_key))
    }
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new()
    }
}
