use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Blockchain
    pub evm_rpc_url: String,
    pub evm_chain_id: u64,

    // Treasury contracts
    pub token_contract_address: Option<String>,
    pub tax_processor_address: Option<String>,
    pub treasury_strategy: String,

    // Sessions
    pub jwt_secret: String,
    pub identity_jwt_secret: String,
    pub session_expiry_days: i64,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            evm_rpc_url: rpc_endpoint_from_env(),
            evm_chain_id: env::var("EVM_CHAIN_ID")
                .unwrap_or_else(|_| "56".to_string())
                .parse()?,

            token_contract_address: env::var("TOKEN_CONTRACT_ADDRESS").ok(),
            tax_processor_address: env::var("TAX_PROCESSOR_ADDRESS").ok(),
            treasury_strategy: env::var("TREASURY_STRATEGY")
                .unwrap_or_else(|_| "direct".to_string()),

            jwt_secret: env::var("JWT_SECRET")?,
            identity_jwt_secret: env::var("IDENTITY_JWT_SECRET")?,
            session_expiry_days: env::var("SESSION_EXPIRY_DAYS")
                .unwrap_or_else(|_| "14".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.evm_rpc_url.trim().is_empty() {
            anyhow::bail!("RPC_ENDPOINT_URL is empty");
        }
        if self.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET is empty");
        }
        if self.identity_jwt_secret.trim().is_empty() {
            anyhow::bail!("IDENTITY_JWT_SECRET is empty");
        }

        if self.token_contract_address.is_none() && self.tax_processor_address.is_none() {
            tracing::warn!(
                "Neither TOKEN_CONTRACT_ADDRESS nor TAX_PROCESSOR_ADDRESS is set; \
                 the treasury endpoint will serve zeroed snapshots"
            );
        }
        if let Some(addr) = &self.token_contract_address {
            if addr.starts_with("0x0000") {
                tracing::warn!("Using placeholder token contract address");
            }
        }
        if let Some(addr) = &self.tax_processor_address {
            if addr.starts_with("0x0000") {
                tracing::warn!("Using placeholder tax processor address");
            }
        }

        match self.treasury_strategy.trim().to_ascii_lowercase().as_str() {
            "direct" | "processor" => {}
            other => tracing::warn!(
                "Unknown TREASURY_STRATEGY '{}'; falling back to direct-token reads",
                other
            ),
        }

        if self.jwt_secret.contains("super_secret") {
            tracing::warn!("Detected dev credentials in config");
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// RPC_ENDPOINT_URL is the documented knob; EVM_RPC_URL is accepted as an
/// alias. Falls back to a public BSC gateway when neither is set.
pub fn rpc_endpoint_from_env() -> String {
    env::var("RPC_ENDPOINT_URL")
        .or_else(|_| env::var("EVM_RPC_URL"))
        .unwrap_or_else(|_| "https://bsc-dataseed1.binance.org".to_string())
}
