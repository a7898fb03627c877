use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use citadel_backend::api::{self, auth::SessionKeys};
use citadel_backend::config::Config;
use citadel_backend::constants::API_VERSION;
use citadel_backend::db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citadel_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Citadel Backend Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    tracing::info!(
        "EVM RPC: {} (chain id {})",
        config.evm_rpc_url,
        config.evm_chain_id
    );

    let db = Database::new(&config).await?;

    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    seed_database(&db, &config).await;

    let sessions = SessionKeys::from_config(&config);
    let app_state = api::AppState {
        db: db.clone(),
        config: config.clone(),
        sessions,
    };

    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Authentication
        .route("/api/auth/session", post(api::auth::create_session))
        .route("/api/auth/logout", post(api::auth::logout))
        .route("/api/auth/me", get(api::auth::me))
        // Users
        .route("/api/users/wallet", post(api::users::register_wallet))
        // Scores / leaderboard
        .route(
            "/api/scores",
            get(api::scores::list_scores).post(api::scores::create_score),
        )
        // Reward log
        .route(
            "/api/rewards",
            get(api::rewards::list_rewards).post(api::rewards::create_reward),
        )
        // Treasury stats
        .route("/api/treasury", get(api::treasury::get_treasury))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Seeds a few sample scores in non-production environments so the
/// leaderboard is never empty during development.
async fn seed_database(db: &Database, config: &Config) {
    if config.is_production() {
        return;
    }

    let seed = async {
        if db.count_scores().await? > 0 {
            return citadel_backend::error::Result::Ok(());
        }
        db.create_score("seed-1", "Knight", 1000).await?;
        db.create_score("seed-2", "Archer", 850).await?;
        db.create_score("seed-3", "Mage", 920).await?;
        Ok(())
    };

    if let Err(err) = seed.await {
        tracing::warn!("Score seeding skipped: {}", err);
    }
}
