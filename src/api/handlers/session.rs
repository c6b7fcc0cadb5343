use axum::{extract::State, Json};

use crate::api::handlers::query::run_query;
use crate::api::handlers::submission::run_submission;
use crate::api::handlers::AppState;
use crate::api::middleware::AppError;
use crate::models::{Branch, LanguageRequest, QueryRequest, SelectRequest, WorksheetRequest};
use crate::services::SessionState;

/// Branch to fetch against, or a halt response carrying the selection prompt
async fn active_branch(state: &AppState) -> Result<Branch, Json<serde_json::Value>> {
    let session = state.session.lock().await;
    session.active_branch().map_err(|prompt| {
        Json(serde_json::json!({
            "status": "halted",
            "prompt": prompt
        }))
    })
}

fn session_view(session: &SessionState) -> serde_json::Value {
    let prompt = session.active_branch().err();
    serde_json::json!({
        "session": session,
        "prompt": prompt
    })
}

/// Current selection and language mode
pub async fn get_session(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session_view(&session)))
}

/// Pick a user in the branch picker; no name resets the selection
pub async fn select_user(
    State(state): State<AppState>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let groups = match payload.name {
        Some(_) => state.catalog.branch_groups().await?,
        None => Default::default(),
    };

    let mut session = state.session.lock().await;
    session.select_user(payload.name.as_deref(), &groups)?;
    Ok(Json(session_view(&session)))
}

/// Pick a branch of the selected user; no name goes back to the user level
pub async fn select_branch(
    State(state): State<AppState>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let groups = match payload.name {
        Some(_) => state.catalog.branch_groups().await?,
        None => Default::default(),
    };

    let mut session = state.session.lock().await;
    session.select_branch(payload.name.as_deref(), &groups)?;
    Ok(Json(session_view(&session)))
}

/// Toggle the worksheet between SQL and Python
pub async fn set_language(
    State(state): State<AppState>,
    Json(payload): Json<LanguageRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut session = state.session.lock().await;
    session.set_language(payload.language);
    Ok(Json(session_view(&session)))
}

/// Tables of the selected branch; halts until a branch is selected
pub async fn session_tables(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let branch = match active_branch(&state).await {
        Ok(branch) => branch,
        Err(halted) => return Ok(halted),
    };

    let tables = state.catalog.list_tables(&branch).await?;
    Ok(Json(serde_json::json!({
        "status": "ready",
        "branch": branch,
        "tables": tables
    })))
}

/// Run a query against the selected branch
pub async fn session_query(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let branch = match active_branch(&state).await {
        Ok(branch) => branch,
        Err(halted) => return Ok(halted),
    };

    let response = run_query(&state, branch, payload).await?;
    Ok(Json(serde_json::json!({
        "status": "ready",
        "result": response
    })))
}

/// Submit worksheet code in the session's language to the selected branch
pub async fn session_submission(
    State(state): State<AppState>,
    Json(payload): Json<WorksheetRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (branch, language) = {
        let session = state.session.lock().await;
        match session.active_branch() {
            Ok(branch) => (branch, session.language()),
            Err(prompt) => {
                return Ok(Json(serde_json::json!({
                    "status": "halted",
                    "prompt": prompt
                })))
            }
        }
    };

    let submission = payload.into_submission(language);
    let receipt = run_submission(&state, &submission, &branch).await?;
    Ok(Json(serde_json::json!({
        "status": "ready",
        "submission": receipt
    })))
}
