//! Handler functions for user profile and management API endpoints.
//!
//! These functions return information about the identity behind the
//! caller's session.

use adapters::{Address, Role};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{AppState, AuthSession};
use crate::errors::AppError;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub address: Address,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// GET /api/user/me
pub async fn current_user(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Result<Json<ProfileResponse>, AppError> {
    let identity = state.auth.identity(&claims.sub).await?;

    Ok(Json(ProfileResponse {
        address: identity.address,
        role: identity.role,
        created_at: identity.created_at,
    }))
}
