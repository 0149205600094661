//! Data structures for authentication-related entities.
//!
//! This module defines the request and response bodies of the auth API, the
//! JWT claims carried by session tokens, and the access/refresh token pair.
//! Request fields are optional so that a missing field is reported as such
//! instead of as a generic body rejection.

use adapters::{Address, Role};
use serde::{Deserialize, Serialize};

/// Which half of a session pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Payload stored in session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Wallet address of the identity
    pub sub: Address,
    /// Role at the time the token was minted
    pub role: Role,
    pub token_type: TokenKind,
    /// Unique token id
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct NonceRequest {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub address: Option<String>,
    pub signature: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub refresh: String,
    pub access: String,
    pub role: Role,
    pub created: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub address: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetRoleResponse {
    pub success: bool,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct AccessTokenRequest {
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

/// Body returned by every endpoint that reissues tokens.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub refresh: String,
    pub access: String,
    pub role: Role,
}

impl TokenPairResponse {
    pub fn new(tokens: SessionTokens, role: Role) -> Self {
        Self {
            refresh: tokens.refresh,
            access: tokens.access,
            role,
        }
    }
}
