use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;
use crate::models::{Branch, QueryResponse};

/// List branches grouped by user
pub async fn list_branches(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let groups = state.catalog.branch_groups().await?;

    Ok(Json(serde_json::json!({
        "users": groups.users
    })))
}

/// List tables on a branch
pub async fn list_tables(
    State(state): State<AppState>,
    Path(branch): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let branch: Branch = branch.parse()?;
    let tables = state.catalog.list_tables(&branch).await?;

    Ok(Json(serde_json::json!({
        "branch": branch,
        "tables": tables
    })))
}

/// Get the column names and types of a table
pub async fn get_table_schema(
    State(state): State<AppState>,
    Path((branch, table)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let branch: Branch = branch.parse()?;
    let schema = state.catalog.table_schema(&branch, &table).await?;

    Ok(Json(serde_json::json!({
        "schema": schema
    })))
}

/// Sampled rows of a table
pub async fn preview_table(
    State(state): State<AppState>,
    Path((branch, table)): Path<(String, String)>,
) -> Result<Json<QueryResponse>, AppError> {
    let branch: Branch = branch.parse()?;
    tracing::info!("Previewing data of {} on branch {}", table, branch);

    let outcome = state.queries.preview_table(&branch, &table).await?;

    Ok(Json(QueryResponse {
        query: format!("preview of {}", table),
        branch,
        preview: true,
        outcome,
        executed_at: chrono::Utc::now(),
    }))
}
