//! Middleware for protecting authenticated routes and handling authorization.
//!
//! Authenticated handlers take an [`AuthSession`] argument; extracting it
//! validates the `Authorization: Bearer <access token>` header and rejects
//! the request with 401 otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use super::models::Claims;
use super::service::AuthService;
use super::tokens::extract_bearer;
use crate::errors::AppError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

/// Claims of a validated access token.
#[derive(Debug, Clone)]
pub struct AuthSession(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = extract_bearer(header_value).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
        })?;

        let claims = state.auth.authenticate(token).map_err(|e| {
            tracing::debug!(error = ?e, "rejected bearer token");
            AppError::from(e)
        })?;

        Ok(AuthSession(claims))
    }
}
