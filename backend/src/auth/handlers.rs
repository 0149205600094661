//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse request bodies, turn raw strings into addresses,
//! roles and signature bytes, and hand the work to `auth::service`.

use adapters::{Address, Role};
use axum::{extract::State, Json};

use super::errors::AuthError;
use super::middleware::{AppState, AuthSession};
use super::models::{
    AccessTokenRequest, LoginRequest, LoginResponse, NonceRequest, NonceResponse, RefreshRequest,
    SetRoleRequest, SetRoleResponse, TokenPairResponse,
};
use super::service::LoginInput;
use crate::errors::AppError;
use crate::middleware::AppJson;

fn require(value: Option<String>, field: &'static str) -> Result<String, AuthError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(AuthError::MissingField(field))
}

fn parse_address(value: Option<String>) -> Result<Address, AuthError> {
    Ok(require(value, "address")?.parse::<Address>()?)
}

/// POST /api/auth/nonce
pub async fn get_nonce(
    State(state): State<AppState>,
    AppJson(body): AppJson<NonceRequest>,
) -> Result<Json<NonceResponse>, AppError> {
    let address = parse_address(body.address)?;
    let nonce = state.auth.issue_challenge(&address).await?;

    Ok(Json(NonceResponse {
        nonce: nonce.to_string(),
    }))
}

/// POST /api/auth/login
pub async fn wallet_login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let address = parse_address(body.address)?;
    let signature = require(body.signature, "signature")?;

    // Unknown role text on login is ignored rather than rejected
    let role = body.role.and_then(|raw| match raw.parse::<Role>() {
        Ok(role) => Some(role),
        Err(_) => {
            tracing::warn!(%address, role = %raw, "ignoring unknown role on login");
            None
        }
    });

    let outcome = state
        .auth
        .login(LoginInput {
            address,
            signature,
            role,
        })
        .await?;

    Ok(Json(LoginResponse {
        refresh: outcome.tokens.refresh,
        access: outcome.tokens.access,
        role: outcome.identity.role,
        created: outcome.created,
    }))
}

/// POST /api/auth/set_role
pub async fn set_role(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    AppJson(body): AppJson<SetRoleRequest>,
) -> Result<Json<SetRoleResponse>, AppError> {
    let address = parse_address(body.address)?;
    let role = body
        .role
        .ok_or(AuthError::InvalidRole)?
        .parse::<Role>()
        .map_err(AuthError::from)?;

    let role = state.auth.set_role(&claims, &address, role).await?;
    Ok(Json(SetRoleResponse {
        success: true,
        role,
    }))
}

/// POST /api/auth/get_access_token
pub async fn get_access_token(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    AppJson(body): AppJson<AccessTokenRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let address = parse_address(body.address)?;
    let (tokens, role) = state.auth.reissue(&claims, &address).await?;
    Ok(Json(TokenPairResponse::new(tokens, role)))
}

/// POST /api/auth/token/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(body): AppJson<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let refresh = require(body.refresh, "refresh")?;
    let (tokens, role) = state.auth.refresh(&refresh).await?;
    Ok(Json(TokenPairResponse::new(tokens, role)))
}
