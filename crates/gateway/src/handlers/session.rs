//! Admin session handlers
//!
//! Logging in exchanges the admin password for a bearer token; without a
//! token every request is served in observer mode.

use crate::middleware::rate_limit::check_login;
use crate::AppState;
use axum::{extract::State, Json};
use citagraph_common::{
    auth::ViewerContext,
    errors::Result,
    metrics, ViewerMode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub mode: ViewerMode,
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub mode: ViewerMode,
}

/// Exchange the admin password for a token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    check_login(&state.login_limiter)?;

    let result = state.auth.login(&request.password);
    metrics::record_login(result.is_ok());

    let token = result.map_err(|e| {
        tracing::warn!("Rejected admin login");
        e
    })?;

    tracing::info!(expires_at = %token.expires_at, "Admin session started");

    Ok(Json(LoginResponse {
        mode: ViewerMode::Admin,
        token: token.token,
        token_type: "Bearer",
        expires_at: token.expires_at.to_rfc3339(),
    }))
}

/// Report the mode of the caller
pub async fn current(viewer: ViewerContext) -> Json<SessionResponse> {
    Json(SessionResponse { mode: viewer.mode })
}
