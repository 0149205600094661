//! Custom error types specific to authentication failures.
//!
//! `AuthError` is the protocol's own taxonomy. Every variant except the
//! storage and internal ones is a client error that is never retried: a
//! failed login always needs a fresh nonce.

use adapters::{ParseError, StoreError};
use thiserror::Error;

use super::signature::SignatureError;
use super::tokens::TokenError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid address.")]
    InvalidAddress,

    #[error("Nonce expired.")]
    NonceExpired,

    #[error("Invalid signature.")]
    InvalidSignature(#[source] SignatureError),

    #[error("Signature mismatch.")]
    SignatureMismatch,

    #[error("Invalid role")]
    InvalidRole,

    #[error("User not found")]
    NotFound,

    #[error("Not allowed to change the role of this address")]
    Forbidden,

    #[error("Invalid or expired token")]
    Unauthorized(#[source] TokenError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ParseError> for AuthError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidAddress(_) => AuthError::InvalidAddress,
            ParseError::InvalidRole(_) => AuthError::InvalidRole,
        }
    }
}

impl From<SignatureError> for AuthError {
    fn from(err: SignatureError) -> Self {
        AuthError::InvalidSignature(err)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) | TokenError::Clock(_) => AuthError::Internal(err.to_string()),
            other => AuthError::Unauthorized(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages() {
        assert_eq!(AuthError::NonceExpired.to_string(), "Nonce expired.");
        assert_eq!(
            AuthError::InvalidSignature(SignatureError::InvalidHex).to_string(),
            "Invalid signature."
        );
        assert_eq!(AuthError::SignatureMismatch.to_string(), "Signature mismatch.");
        assert_eq!(AuthError::InvalidRole.to_string(), "Invalid role");
        assert_eq!(
            AuthError::MissingField("address").to_string(),
            "Missing required field: address"
        );
    }

    #[test]
    fn test_from_parse_error() {
        assert!(matches!(
            AuthError::from(ParseError::InvalidRole("superuser".into())),
            AuthError::InvalidRole
        ));
        assert!(matches!(
            AuthError::from(ParseError::InvalidAddress("0x12".into())),
            AuthError::InvalidAddress
        ));
    }

    #[test]
    fn test_from_token_error() {
        assert!(matches!(
            AuthError::from(TokenError::Expired),
            AuthError::Unauthorized(TokenError::Expired)
        ));
        assert!(matches!(
            AuthError::from(TokenError::Signing("boom".into())),
            AuthError::Internal(_)
        ));
    }
}
