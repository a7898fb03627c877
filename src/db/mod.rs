use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{config::Config, error::Result, models::*};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ==================== USER QUERIES ====================
impl Database {
    /// Upsert keyed on the identity provider uid; refreshes the twitter
    /// fields when the provider supplies them.
    pub async fn upsert_user(
        &self,
        uid: &str,
        twitter_username: Option<&str>,
        twitter_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, twitter_username, twitter_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET twitter_username = COALESCE(EXCLUDED.twitter_username, users.twitter_username),
                twitter_id       = COALESCE(EXCLUDED.twitter_id, users.twitter_id),
                updated_at       = NOW()
            "#,
        )
        .bind(uid)
        .bind(twitter_username)
        .bind(twitter_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user(&self, uid: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn set_wallet(
        &self,
        uid: &str,
        wallet: &str,
        twitter_username: Option<&str>,
        twitter_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, wallet, twitter_username, twitter_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET wallet           = EXCLUDED.wallet,
                twitter_username = COALESCE(EXCLUDED.twitter_username, users.twitter_username),
                twitter_id       = COALESCE(EXCLUDED.twitter_id, users.twitter_id),
                updated_at       = NOW()
            "#,
        )
        .bind(uid)
        .bind(wallet)
        .bind(twitter_username)
        .bind(twitter_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Raises the stored high score when the submitted one beats it.
    pub async fn bump_high_score(&self, uid: &str, score: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET high_score = GREATEST(COALESCE(high_score, 0), $2),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(uid)
        .bind(score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ==================== SCORE QUERIES ====================
impl Database {
    pub async fn top_scores(&self, limit: i64) -> Result<Vec<Score>> {
        let scores = sqlx::query_as::<_, Score>(
            "SELECT * FROM scores ORDER BY score DESC, created_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(scores)
    }

    pub async fn create_score(&self, user_id: &str, username: &str, score: i64) -> Result<Score> {
        let row = sqlx::query_as::<_, Score>(
            r#"
            INSERT INTO scores (user_id, username, score)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count_scores(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scores")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// ==================== REWARD LOG QUERIES ====================
impl Database {
    pub async fn create_reward_log(
        &self,
        tx_link: &str,
        player: &str,
        amount: rust_decimal::Decimal,
    ) -> Result<RewardLog> {
        let row = sqlx::query_as::<_, RewardLog>(
            r#"
            INSERT INTO reward_logs (tx_link, player, amount)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tx_link)
        .bind(player)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_reward_logs(&self, limit: i64) -> Result<Vec<RewardLog>> {
        let rows = sqlx::query_as::<_, RewardLog>(
            "SELECT * FROM reward_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(database_url: &str) -> Config {
        Config {
            host: "0.0.0.0".to_string(),
            port: 5000,
            environment: "development".to_string(),
            database_url: database_url.to_string(),
            database_max_connections: 1,
            evm_rpc_url: "http://localhost:8545".to_string(),
            evm_chain_id: 56,
            token_contract_address: None,
            tax_processor_address: None,
            treasury_strategy: "direct".to_string(),
            jwt_secret: "test_secret".to_string(),
            identity_jwt_secret: "test_identity_secret".to_string(),
            session_expiry_days: 14,
            cors_allowed_origins: "*".to_string(),
        }
    }

    #[tokio::test]
    async fn database_new_returns_error_on_invalid_url() {
        let config = test_config("not-a-url");
        let result = Database::new(&config).await;
        assert!(result.is_err());
    }
}
