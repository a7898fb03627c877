use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::RewardLog,
};

use super::{require_user, AppState};

const REWARD_LOG_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRewardLogRequest {
    pub tx_link: String,
    pub player: String,
    pub amount: Decimal,
}

/// GET /api/rewards
pub async fn list_rewards(State(state): State<AppState>) -> Result<Json<Vec<RewardLog>>> {
    let rewards = state.db.list_reward_logs(REWARD_LOG_LIMIT).await?;
    Ok(Json(rewards))
}

/// POST /api/rewards
pub async fn create_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<InsertRewardLogRequest>,
) -> Result<(StatusCode, Json<RewardLog>)> {
    require_user(&headers, &state)?;

    let tx_link = req.tx_link.trim();
    if !tx_link.starts_with("http://") && !tx_link.starts_with("https://") {
        return Err(AppError::BadRequest(
            "txLink must be a valid URL".to_string(),
        ));
    }
    if req.player.trim().is_empty() {
        return Err(AppError::BadRequest("Player must not be empty".to_string()));
    }
    if req.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("Amount must be positive".to_string()));
    }

    let reward = state
        .db
        .create_reward_log(tx_link, req.player.trim(), req.amount)
        .await?;

    Ok((StatusCode::CREATED, Json(reward)))
}
