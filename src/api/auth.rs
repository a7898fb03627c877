use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, Result},
};

use super::{require_user, AppState};

// ==================== REQUEST/RESPONSE TYPES ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub uid: String,
    pub twitter_username: Option<String>,
    pub wallet: Option<String>,
    pub high_score: Option<i64>,
}

/// Claims we accept from the third-party identity provider's token.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub twitter_id: Option<String>,
    pub exp: usize,
}

/// Claims carried by our own session tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub username: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

// ==================== SESSION KEYS ====================

/// Verification and signing keys, built once at startup and passed through
/// `AppState` instead of living behind a module-level init flag.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    session_decoding: DecodingKey,
    identity_decoding: DecodingKey,
    expiry_days: i64,
}

impl SessionKeys {
    pub fn from_config(config: &Config) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            session_decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            identity_decoding: DecodingKey::from_secret(config.identity_jwt_secret.as_bytes()),
            expiry_days: config.session_expiry_days,
        }
    }

    pub fn verify_identity_token(&self, token: &str) -> Result<IdentityClaims> {
        let data = decode::<IdentityClaims>(token, &self.identity_decoding, &Validation::default())
            .map_err(|_| AppError::AuthError("Invalid identity token".to_string()))?;
        Ok(data.claims)
    }

    pub fn issue_session(&self, uid: &str, username: Option<&str>) -> Result<(String, i64)> {
        let now = Utc::now();
        let expires_in = Duration::days(self.expiry_days).num_seconds();
        let claims = SessionClaims {
            sub: uid.to_string(),
            username: username.map(str::to_string),
            exp: (now.timestamp() + expires_in) as usize,
            iat: now.timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;
        Ok((token, expires_in))
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.session_decoding, &Validation::default())
            .map_err(|_| AppError::InvalidToken)?;
        Ok(data.claims)
    }
}

// ==================== HANDLERS ====================

/// POST /api/auth/session
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>> {
    let identity = state.sessions.verify_identity_token(&req.id_token)?;

    state
        .db
        .upsert_user(
            &identity.sub,
            identity.preferred_username.as_deref(),
            identity.twitter_id.as_deref(),
        )
        .await?;

    let (token, expires_in) = state
        .sessions
        .issue_session(&identity.sub, identity.preferred_username.as_deref())?;

    Ok(Json(CreateSessionResponse { token, expires_in }))
}

/// POST /api/auth/logout
///
/// Sessions are stateless bearer tokens, so logout is an acknowledgment; the
/// client discards its token.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<MeResponse>> {
    let claims = require_user(&headers, &state)?;

    let user = state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        uid: user.id,
        twitter_username: user.twitter_username,
        wallet: user.wallet,
        high_score: user.high_score,
    }))
}
