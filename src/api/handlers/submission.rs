use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;
use crate::models::{Branch, Submission, SubmissionReceipt};

/// Stage worksheet code as a project and run it against a branch
pub async fn create_submission(
    State(state): State<AppState>,
    Path(branch): Path<String>,
    Json(payload): Json<Submission>,
) -> Result<Json<serde_json::Value>, AppError> {
    let branch: Branch = branch.parse()?;
    let receipt = run_submission(&state, &payload, &branch).await?;

    Ok(Json(serde_json::json!({
        "submission": receipt
    })))
}

pub(crate) async fn run_submission(
    state: &AppState,
    submission: &Submission,
    branch: &Branch,
) -> Result<SubmissionReceipt, AppError> {
    tracing::info!(
        "Received {} submission for branch {}",
        submission.language.as_str(),
        branch
    );

    let receipt = state.submissions.submit(submission, branch).await?;

    // Materialized tables make cached previews of this branch stale
    if receipt.materialize && receipt.completion.is_completed() {
        state.queries.cache().invalidate_branch(branch).await;
    }

    Ok(receipt)
}
