use axum::{
    extract::{ConnectInfo, State},
    Json,
};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::auth::TokenResponse;
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Exchanges the shared admin secret for a short-lived session token.
/// Attempts are rate limited per client IP before the secret is checked.
pub async fn login(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let key = addr
        .map(|ConnectInfo(a)| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    state.services.login_limiter.check(&key).await?;

    let issued = state.services.auth.login(&payload.password)?;
    state.services.login_limiter.record_success(&key).await;

    Ok(Json(issued))
}
