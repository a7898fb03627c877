pub mod auth;
pub mod health;
pub mod rewards;
pub mod scores;
pub mod treasury;
pub mod users;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};

use auth::{SessionClaims, SessionKeys};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub sessions: SessionKeys,
}

/// Extracts and verifies the bearer session token; 401 when absent or bad.
pub fn require_user(headers: &HeaderMap, state: &AppState) -> Result<SessionClaims> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthError("Invalid Authorization scheme".to_string()))?;

    state.sessions.verify_session(token)
}

/// Like `require_user` but anonymous requests are fine; a malformed token is
/// treated as no session rather than rejected (score submission stays open).
pub fn optional_user(headers: &HeaderMap, state: &AppState) -> Option<SessionClaims> {
    require_user(headers, state).ok()
}
