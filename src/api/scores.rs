use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;

use crate::{
    constants::LEADERBOARD_LIMIT,
    error::{AppError, Result},
    models::Score,
};

use super::{optional_user, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertScoreRequest {
    pub score: i64,
    pub username: Option<String>,
    pub user_id: Option<String>,
}

/// GET /api/scores
pub async fn list_scores(State(state): State<AppState>) -> Result<Json<Vec<Score>>> {
    let scores = state.db.top_scores(LEADERBOARD_LIMIT).await?;
    Ok(Json(scores))
}

/// POST /api/scores
///
/// Anonymous submissions are accepted; when a valid session accompanies the
/// request the score is bound to that user and their stored twitter handle
/// wins over whatever username the body carried.
pub async fn create_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<InsertScoreRequest>,
) -> Result<(StatusCode, Json<Score>)> {
    if req.score < 0 {
        return Err(AppError::BadRequest("Score must be non-negative".to_string()));
    }
    if let Some(name) = &req.username {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Username must not be empty".to_string()));
        }
    }

    let session = optional_user(&headers, &state);

    let (user_id, username) = match &session {
        Some(claims) => {
            let stored = state
                .db
                .get_user(&claims.sub)
                .await
                .ok()
                .flatten()
                .and_then(|u| u.twitter_username);
            let name = stored
                .or_else(|| claims.username.clone())
                .or_else(|| req.username.clone())
                .unwrap_or_else(|| "anonymous".to_string());
            (claims.sub.clone(), name)
        }
        None => (
            req.user_id.clone().unwrap_or_else(|| "anonymous".to_string()),
            req.username.clone().unwrap_or_else(|| "anonymous".to_string()),
        ),
    };

    let score = state.db.create_score(&user_id, &username, req.score).await?;

    if session.is_some() {
        state.db.bump_high_score(&user_id, req.score).await?;
    }

    Ok((StatusCode::CREATED, Json(score)))
}
