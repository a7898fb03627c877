use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    services::treasury::parse_contract_address,
};

use super::{require_user, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWalletRequest {
    pub wallet: String,
    pub twitter_username: Option<String>,
    pub twitter_id: Option<String>,
}

/// POST /api/users/wallet
pub async fn register_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterWalletRequest>,
) -> Result<StatusCode> {
    let claims = require_user(&headers, &state)?;

    let wallet = req.wallet.trim();
    if parse_contract_address(wallet).is_none() {
        return Err(AppError::BadRequest(
            "Invalid wallet address format (expected 0x + 40 hex chars)".to_string(),
        ));
    }

    state
        .db
        .set_wallet(
            &claims.sub,
            wallet,
            req.twitter_username.as_deref(),
            req.twitter_id.as_deref(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
