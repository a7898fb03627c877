use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::services::treasury::{
    self, RpcCalls, TreasuryReadOptions, TreasurySettings, TreasurySnapshot,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct TreasuryQuery {
    pub token: Option<String>,
    pub debug: Option<String>,
}

fn flag_is_set(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

/// GET /api/treasury
///
/// Always responds 200. Any internal failure, including a missing contract
/// address, is logged and rendered as a zeroed snapshot so the dashboard
/// never sees an error state.
pub async fn get_treasury(
    State(state): State<AppState>,
    Query(query): Query<TreasuryQuery>,
) -> Json<TreasurySnapshot> {
    let opts = TreasuryReadOptions {
        token_address: query.token,
        include_debug: flag_is_set(query.debug.as_deref()),
    };

    let settings = TreasurySettings::from_config(&state.config);
    let snapshot = match RpcCalls::new(&state.config.evm_rpc_url) {
        Ok(calls) => match treasury::read_treasury(&calls, &settings, &opts).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("treasury read unavailable: {}", err);
                TreasurySnapshot::zeroed()
            }
        },
        Err(err) => {
            tracing::warn!("treasury RPC client unavailable: {}", err);
            TreasurySnapshot::zeroed()
        }
    };

    Json(snapshot)
}
