use chrono::Utc;

use crate::api::middleware::AppError;
use crate::models::{abbreviate_query, Branch, Submission, SubmissionReceipt};
use crate::services::dag_gateway::DagGateway;
use crate::services::project_builder::ProjectBuilder;

/// Validate, stage, submit and clean up one worksheet submission
pub struct SubmissionService {
    builder: ProjectBuilder,
    gateway: DagGateway,
}

impl SubmissionService {
    pub fn new(builder: ProjectBuilder, gateway: DagGateway) -> Self {
        Self { builder, gateway }
    }

    /// Materialize a submission onto `branch`.
    ///
    /// Empty code and invalid model names fail before the workspace or the
    /// runner is touched. The staged directory is removed once the runner
    /// returns, whatever the outcome.
    pub async fn submit(
        &self,
        submission: &Submission,
        branch: &Branch,
    ) -> Result<SubmissionReceipt, AppError> {
        let submitted_at = Utc::now();
        let project = self.builder.build(submission).await?;

        tracing::info!(
            "Running {} submission \"{}\" on branch \"{}\"",
            submission.language.as_str(),
            abbreviate_query(submission.trimmed_body()),
            branch
        );

        let completion = self.gateway.submit(&project, branch).await;

        let id = project.id();
        let source_file = project.source_file().to_string();
        if let Err(e) = project.discard().await {
            tracing::warn!("Could not clean up project {}: {}", id, e);
        }

        Ok(SubmissionReceipt {
            id,
            branch: branch.clone(),
            language: submission.language,
            source_file,
            materialize: submission.materialize,
            completion,
            submitted_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::models::{Completion, Language, PipDependency};
    use crate::services::testing::RecordingRunner;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn service(root: &std::path::Path, runner: Arc<RecordingRunner>) -> SubmissionService {
        let builder = ProjectBuilder::new(
            root,
            ProjectConfig {
                id: "test-project".into(),
                name: "temp_project".into(),
                python_version: "3.11".into(),
            },
        );
        SubmissionService::new(builder, DagGateway::new(runner))
    }

    fn workspace_entries(root: &std::path::Path) -> usize {
        if !root.exists() {
            return 0;
        }
        std::fs::read_dir(root).unwrap().count()
    }

    #[tokio::test]
    async fn test_blank_submission_never_reaches_runner() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("workspace");
        let runner = Arc::new(RecordingRunner::new(true));
        let service = service(&root, runner.clone());

        let result = service
            .submit(&Submission::sql("   ", Some("orders_clean"), true), &Branch::Main)
            .await;
        tokio_test::assert_err!(&result);
        assert!(matches!(result, Err(AppError::UserInputEmpty(_))));

        assert_eq!(runner.run_count(), 0);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_submission_handed_to_runner_then_removed() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(true));
        let service = service(tmp.path(), runner.clone());
        let branch = Branch::user_branch("alice", "dev");

        let receipt = service
            .submit(
                &Submission::python("def m():\n    return 1", Some(PipDependency::new("requests", "2.31")), true),
                &branch,
            )
            .await;
        let receipt = tokio_test::assert_ok!(receipt);

        assert_eq!(receipt.completion, Completion::Completed);
        assert_eq!(receipt.language, Language::Python);
        assert_eq!(receipt.source_file, "models.py");

        let runs = runner.runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        let (dir, run_branch, files) = &runs[0];
        assert_eq!(run_branch, "alice.dev");
        assert_eq!(files, &vec!["bauplan_project.yml".to_string(), "models.py".to_string()]);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_second_submission_leaves_no_residue_from_first() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(true));
        let service = service(tmp.path(), runner.clone());

        service
            .submit(&Submission::sql("SELECT 1", Some("first"), false), &Branch::Main)
            .await
            .unwrap();
        service
            .submit(&Submission::sql("SELECT 2", Some("second"), false), &Branch::Main)
            .await
            .unwrap();

        let runs = runner.runs.lock().unwrap();
        assert_eq!(runs[1].2, vec!["bauplan_project.yml".to_string(), "second.sql".to_string()]);
        assert_ne!(runs[0].0, runs[1].0);
        assert_eq!(workspace_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_failed_run_still_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(false));
        let service = service(tmp.path(), runner.clone());

        let receipt = service
            .submit(&Submission::sql("SELECT 1", None, true), &Branch::Main)
            .await
            .unwrap();

        assert!(matches!(receipt.completion, Completion::NotCompleted { .. }));
        assert!(receipt.materialize);
        assert_eq!(workspace_entries(tmp.path()), 0);
    }
}
