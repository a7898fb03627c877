use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ==================== USER ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub twitter_username: Option<String>,
    pub twitter_id: Option<String>,
    pub wallet: Option<String>,
    pub high_score: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==================== SCORE ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

// ==================== REWARD LOG ====================
// Manual registry of paid-out rewards: transaction link, player, amount.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RewardLog {
    pub id: i64,
    pub tx_link: String,
    pub player: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}
