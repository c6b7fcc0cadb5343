use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::branch::Branch;

/// Default SQL model name when none is given
pub const DEFAULT_MODEL_NAME: &str = "model";

/// Language of worksheet code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Sql,
    Python,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Sql => "sql",
            Language::Python => "python",
        }
    }
}

/// One pip requirement pinned by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipDependency {
    pub package: String,
    pub version: String,
}

impl PipDependency {
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
        }
    }
}

/// Code submitted from the worksheet for materialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub language: Language,
    pub body: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub materialize: bool,
    #[serde(default)]
    pub dependency: Option<PipDependency>,
}

impl Submission {
    pub fn sql(body: impl Into<String>, model_name: Option<&str>, materialize: bool) -> Self {
        Self {
            language: Language::Sql,
            body: body.into(),
            model_name: model_name.map(str::to_string),
            materialize,
            dependency: None,
        }
    }

    pub fn python(
        body: impl Into<String>,
        dependency: Option<PipDependency>,
        materialize: bool,
    ) -> Self {
        Self {
            language: Language::Python,
            body: body.into(),
            model_name: None,
            materialize,
            dependency,
        }
    }

    /// User code with surrounding whitespace removed
    pub fn trimmed_body(&self) -> &str {
        self.body.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.trimmed_body().is_empty()
    }

    /// Dependency declared by the user, ignoring blank form fields
    pub fn effective_dependency(&self) -> Option<&PipDependency> {
        self.dependency
            .as_ref()
            .filter(|dep| !dep.package.trim().is_empty())
    }
}

/// Session-scoped submission request: language comes from the session mode
#[derive(Debug, Deserialize)]
pub struct WorksheetRequest {
    pub body: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub materialize: bool,
    #[serde(default)]
    pub dependency: Option<PipDependency>,
}

impl WorksheetRequest {
    pub fn into_submission(self, language: Language) -> Submission {
        Submission {
            language,
            body: self.body,
            model_name: self.model_name,
            materialize: self.materialize,
            dependency: self.dependency,
        }
    }
}

/// Whether the DAG runner finished the submitted project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion {
    Completed,
    NotCompleted { message: String },
}

impl Completion {
    pub fn is_completed(&self) -> bool {
        matches!(self, Completion::Completed)
    }
}

/// Record of one submission handed to the DAG runner
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub branch: Branch,
    pub language: Language,
    pub source_file: String,
    pub materialize: bool,
    pub completion: Completion,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
