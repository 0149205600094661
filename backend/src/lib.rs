//! Wallet-signature authentication backend for the EMR platform.
//!
//! Users prove control of a wallet by signing a one-time nonce; the backend
//! answers with session tokens carrying the wallet's role.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod services;

use axum::{routing::get, Router};

use crate::auth::AppState;

/// Build the full application router over `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/api/auth", auth::auth_router())
        .nest("/api/user", api::user::routes::user_router())
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "EMR wallet authentication backend"
}
