//! Module for background services.
//!
//! These run alongside the HTTP server and keep the in-process stores in
//! shape; the auth protocol itself never depends on them.

pub mod nonce_janitor;

pub use nonce_janitor::spawn_nonce_janitor;
