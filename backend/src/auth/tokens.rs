//! Session token minting and validation.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret handed over at
//! construction. Nothing is stored server-side: a token is valid while its
//! signature checks out and `exp` has not passed.

use std::time::{SystemTime, UNIX_EPOCH};

use adapters::Identity;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use super::models::{Claims, SessionTokens, TokenKind};

/// Shortest secret accepted outside dev mode.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest lifetime accepted for either token kind (ten years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,

    #[error("expected {expected} token, got {found}")]
    WrongKind { expected: TokenKind, found: TokenKind },

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("system time error: {0}")]
    Clock(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuerConfigError {
    #[error("token secret must be at least 32 bytes")]
    SecretTooShort,

    #[error("token lifetimes must be non-zero")]
    ZeroTtl,

    #[error("token lifetimes must not exceed ten years")]
    TtlTooLong,
}

/// Mints and validates session token pairs.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("secret", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl SessionIssuer {
    pub fn new(
        secret: &[u8],
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
    ) -> Result<Self, IssuerConfigError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(IssuerConfigError::SecretTooShort);
        }
        if access_ttl_secs == 0 || refresh_ttl_secs == 0 {
            return Err(IssuerConfigError::ZeroTtl);
        }
        if access_ttl_secs > MAX_TTL_SECS || refresh_ttl_secs > MAX_TTL_SECS {
            return Err(IssuerConfigError::TtlTooLong);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl_secs,
            refresh_ttl_secs,
        })
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs
    }

    /// Mint an access/refresh pair for `identity` carrying its current role.
    pub fn mint(&self, identity: &Identity) -> Result<SessionTokens, TokenError> {
        let now = unix_now()?;
        Ok(SessionTokens {
            access: self.sign(identity, TokenKind::Access, now)?,
            refresh: self.sign(identity, TokenKind::Refresh, now)?,
        })
    }

    /// Check signature and expiry and return the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }

    /// [`validate`](Self::validate) and require a particular token kind.
    pub fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.validate(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongKind {
                expected,
                found: claims.token_type,
            });
        }
        Ok(claims)
    }

    fn sign(&self, identity: &Identity, kind: TokenKind, now: u64) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };

        let exp = now
            .checked_add(ttl)
            .ok_or_else(|| TokenError::Signing("token expiry overflows".to_string()))?;

        let claims = Claims {
            sub: identity.address,
            role: identity.role,
            token_type: kind,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| TokenError::Clock(e.to_string()))
}

/// Extract a bearer token from an `Authorization` header value.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
