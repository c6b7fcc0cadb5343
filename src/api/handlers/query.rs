use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;
use crate::models::{Branch, QueryRequest, QueryResponse};

/// Execute SQL against a branch through the preview cache
pub async fn execute_query(
    State(state): State<AppState>,
    Path(branch): Path<String>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let branch: Branch = branch.parse()?;
    run_query(&state, branch, payload).await.map(Json)
}

pub(crate) async fn run_query(
    state: &AppState,
    branch: Branch,
    payload: QueryRequest,
) -> Result<QueryResponse, AppError> {
    let outcome = state
        .queries
        .execute(&payload.query, &branch, payload.preview)
        .await?;

    Ok(QueryResponse {
        branch,
        query: payload.query,
        preview: payload.preview,
        outcome,
        executed_at: chrono::Utc::now(),
    })
}

/// Cache statistics for this session
pub async fn cache_stats(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let stats = state.queries.cache().stats().await;
    let hit_ratio = stats.hit_ratio();

    Ok(Json(serde_json::json!({
        "stats": stats,
        "hit_ratio": hit_ratio
    })))
}

/// Drop every cached result
pub async fn clear_cache(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = state.queries.cache().clear().await;

    Ok(Json(serde_json::json!({
        "removed": removed
    })))
}

/// Drop cached results of one branch, e.g. after materializing onto it
pub async fn invalidate_branch_cache(
    State(state): State<AppState>,
    Path(branch): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let branch: Branch = branch.parse()?;
    let removed = state.queries.cache().invalidate_branch(&branch).await;

    Ok(Json(serde_json::json!({
        "branch": branch,
        "removed": removed
    })))
}
