use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::branch::Branch;
use crate::api::middleware::AppError;

/// Characters of query text kept when a query is echoed back in logs
pub const QUERY_ECHO_MAX_CHARS: usize = 30;

/// Tabular query result: ordered column names and rows of JSON values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }
}

/// Why a query produced no table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    ResultTooLarge,
    NotFound,
    RemoteUnreachable,
    Rejected,
}

impl FailureReason {
    /// Classify a remote error; `None` for errors caused locally
    pub fn classify(err: &AppError) -> Option<Self> {
        match err {
            AppError::ResultTooLarge(_) => Some(FailureReason::ResultTooLarge),
            AppError::NotFound(_) => Some(FailureReason::NotFound),
            AppError::RemoteUnreachable(_) | AppError::Internal(_) => {
                Some(FailureReason::RemoteUnreachable)
            }
            AppError::Rejected(_) => Some(FailureReason::Rejected),
            AppError::UserInputEmpty(_)
            | AppError::Filesystem(_)
            | AppError::InvalidSql(_)
            | AppError::Validation(_) => None,
        }
    }

    /// Message shown to the user in place of the raw failure
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureReason::ResultTooLarge => {
                "The table is probably too big to be displayed. Please use the query worksheet instead."
            }
            FailureReason::NotFound => "Are you sure the table exists in the branch?",
            FailureReason::RemoteUnreachable => {
                "The data catalog could not be reached. Please try again later."
            }
            FailureReason::Rejected => "The query engine rejected the query.",
        }
    }
}

/// Result of executing one query against a branch
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Table {
        table: ResultTable,
        cached: bool,
    },
    Failed {
        reason: FailureReason,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl QueryOutcome {
    /// Convert a remote error into a failed outcome.
    /// Engine rejections keep the engine's own message.
    pub fn from_remote_error(reason: FailureReason, err: &AppError) -> Self {
        let message = match (reason, err) {
            (FailureReason::Rejected, AppError::Rejected(engine_msg)) => {
                format!("{} {}", reason.user_message(), engine_msg)
            }
            _ => reason.user_message().to_string(),
        };

        QueryOutcome::Failed {
            reason,
            message,
            details: Some(err.to_string()),
        }
    }

    pub fn table(&self) -> Option<&ResultTable> {
        match self {
            QueryOutcome::Table { table, .. } => Some(table),
            QueryOutcome::Failed { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            QueryOutcome::Table { .. } => None,
            QueryOutcome::Failed { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub branch: Branch,
    pub query: String,
    pub preview: bool,
    pub outcome: QueryOutcome,
    pub executed_at: DateTime<Utc>,
}

/// Shorten query text for log lines
pub fn abbreviate_query(query: &str) -> String {
    match query.char_indices().nth(QUERY_ECHO_MAX_CHARS) {
        Some((cut, _)) => format!("{} ...", &query[..cut]),
        None => query.to_string(),
    }
}
