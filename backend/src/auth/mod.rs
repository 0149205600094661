//! Authentication module for wallet logins, sessions and role management.
//!
//! This module provides the public interface for the wallet-signature login
//! protocol: challenge nonces, signature recovery, session token issuance,
//! role changes and the extractor that guards authenticated routes.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod signature;
pub mod tokens;

// Re-exports for convenience
pub use errors::AuthError;
pub use middleware::{AppState, AuthSession};
pub use models::{Claims, SessionTokens, TokenKind};
pub use routes::auth_router;
pub use service::{AuthPolicy, AuthService, LoginInput, LoginOutcome};
pub use signature::{SignatureError, SignatureVerifier};
pub use tokens::{SessionIssuer, TokenError};
