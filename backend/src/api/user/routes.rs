//! Defines the HTTP routes for user profile data.

use axum::{routing::get, Router};

use super::handlers::current_user;
use crate::auth::AppState;

pub fn user_router() -> Router<AppState> {
    Router::new().route("/me", get(current_user))
}
