//! Core `adapters` crate for the storage collaborators of wallet authentication.
//!
//! This crate defines the `NonceStore` and `IdentityRegistry` traits, which
//! outline what the auth protocol needs from a transient cache and a durable
//! identity store, and provides in-process implementations of both.

pub mod errors;
pub mod identity;
pub mod models;
pub mod nonce;

pub use errors::{ParseError, StoreError};
pub use identity::{IdentityRegistry, MemoryIdentityRegistry};
pub use models::{Address, Identity, Nonce, Role};
pub use nonce::{MemoryNonceStore, NonceStore, DEFAULT_NONCE_TTL};
