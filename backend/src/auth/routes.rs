//! Defines the HTTP routes specifically for authentication.
//!
//! Challenge issuance, wallet login and token refresh are open; role changes
//! and token reissue require a bearer access token.

use axum::{routing::post, Router};

use super::handlers::{get_access_token, get_nonce, refresh_token, set_role, wallet_login};
use super::middleware::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/nonce", post(get_nonce))
        .route("/login", post(wallet_login))
        .route("/set_role", post(set_role))
        .route("/get_access_token", post(get_access_token))
        .route("/token/refresh", post(refresh_token))
}
