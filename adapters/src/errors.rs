//! Custom error types specific to the `adapters` crate.
//!
//! `ParseError` covers text that cannot become an [`Address`](crate::Address)
//! or [`Role`](crate::Role). `StoreError` is what a backing cache or database
//! reports when it cannot serve a request at all.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid wallet address: {0:?}")]
    InvalidAddress(String),

    #[error("invalid role: {0:?}")]
    InvalidRole(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation failed: {0}")]
    Backend(String),
}
