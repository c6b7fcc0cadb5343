// Ephemeral Project Builder
//
// Stages one submission as a minimal project directory (manifest + one source file)
// for the DAG runner. Every submission gets its own freshly created directory under
// the workspace root, so concurrent submissions never share files.

use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::api::middleware::AppError;
use crate::config::ProjectConfig;
use crate::models::{Language, Submission, DEFAULT_MODEL_NAME};
use crate::services::framing::SourceFraming;

pub const MANIFEST_FILE: &str = "bauplan_project.yml";
pub const PYTHON_SOURCE_FILE: &str = "models.py";
pub const SQL_EXTENSION: &str = "sql";

#[derive(Debug, Serialize)]
struct ProjectManifest<'a> {
    project: ProjectIdentity<'a>,
    defaults: ProjectDefaults<'a>,
}

#[derive(Debug, Serialize)]
struct ProjectIdentity<'a> {
    id: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ProjectDefaults<'a> {
    python_version: &'a str,
}

/// A staged submission on disk
#[derive(Debug)]
pub struct EphemeralProject {
    id: Uuid,
    dir: PathBuf,
    source_file: String,
}

impl EphemeralProject {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Project directory handed to the DAG runner
    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.join(&self.source_file)
    }

    /// Remove this submission's directory
    pub async fn discard(self) -> Result<(), AppError> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                tracing::debug!("Removed project directory {}", self.dir.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct ProjectBuilder {
    workspace_root: PathBuf,
    project: ProjectConfig,
}

impl ProjectBuilder {
    pub fn new(workspace_root: impl Into<PathBuf>, project: ProjectConfig) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            project,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Stage a submission as a project directory.
    ///
    /// Blank code and invalid model names are refused before anything is written.
    /// If a write fails midway the directory is removed again before returning.
    pub async fn build(&self, submission: &Submission) -> Result<EphemeralProject, AppError> {
        if submission.is_blank() {
            return Err(AppError::UserInputEmpty(empty_input_prompt(submission.language).to_string()));
        }

        let source_file = source_file_name(submission)?;
        let source = SourceFraming::for_submission(submission, &self.project.python_version)
            .render(submission.trimmed_body());
        let manifest = serde_yaml::to_string(&self.manifest())?;

        let id = Uuid::new_v4();
        let dir = self.workspace_root.join(format!("submission-{}", id));

        tokio::fs::create_dir_all(&self.workspace_root).await?;
        tokio::fs::create_dir(&dir).await?;

        if let Err(e) = write_project_files(&dir, &manifest, &source_file, &source).await {
            tracing::error!("Failed to stage project in {}: {}", dir.display(), e);
            if let Err(cleanup) = tokio::fs::remove_dir_all(&dir).await {
                tracing::warn!("Could not remove partial project {}: {}", dir.display(), cleanup);
            }
            return Err(e.into());
        }

        tracing::info!(
            "Staged {} submission {} as {}",
            submission.language.as_str(),
            id,
            dir.join(&source_file).display()
        );

        Ok(EphemeralProject {
            id,
            dir,
            source_file,
        })
    }

    fn manifest(&self) -> ProjectManifest<'_> {
        ProjectManifest {
            project: ProjectIdentity {
                id: &self.project.id,
                name: &self.project.name,
            },
            defaults: ProjectDefaults {
                python_version: &self.project.python_version,
            },
        }
    }
}

async fn write_project_files(
    dir: &Path,
    manifest: &str,
    source_file: &str,
    source: &str,
) -> std::io::Result<()> {
    tokio::fs::write(dir.join(MANIFEST_FILE), manifest).await?;
    tokio::fs::write(dir.join(source_file), source).await?;
    Ok(())
}

fn empty_input_prompt(language: Language) -> &'static str {
    match language {
        Language::Python => "Nothing to run. Please write a function and press Run.",
        Language::Sql => "No query to run. Please write a query and press Run.",
    }
}

/// `models.py` for Python, `{model_name}.sql` for SQL
fn source_file_name(submission: &Submission) -> Result<String, AppError> {
    match submission.language {
        Language::Python => Ok(PYTHON_SOURCE_FILE.to_string()),
        Language::Sql => {
            let name = submission
                .model_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_MODEL_NAME);

            if !is_model_identifier(name) {
                return Err(AppError::Validation(format!(
                    "Invalid model name '{}': use letters, digits and underscores, not starting with a digit",
                    name
                )));
            }
            Ok(format!("{}.{}", name, SQL_EXTENSION))
        }
    }
}

fn is_model_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PipDependency;
    use tempfile::TempDir;

    fn project_config() -> ProjectConfig {
        ProjectConfig {
            id: "5b0f3e52-7c1d-4f6a-9e2b-8d4c1a7f3e90".to_string(),
            name: "temp_project".to_string(),
            python_version: "3.11".to_string(),
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_sql_submission_file_name_and_content() {
        let tmp = TempDir::new().unwrap();
        let builder = ProjectBuilder::new(tmp.path(), project_config());
        let query = "SELECT id, amount FROM orders WHERE amount > 0";

        let project = builder
            .build(&Submission::sql(query, Some("orders_clean"), false))
            .await
            .unwrap();

        assert_eq!(project.source_file(), "orders_clean.sql");
        assert_eq!(entries(project.path()), vec![MANIFEST_FILE, "orders_clean.sql"]);

        let content = std::fs::read_to_string(project.source_path()).unwrap();
        assert_eq!(content, format!("-- bauplan: materialize=False\n{}", query));
    }

    #[tokio::test]
    async fn test_python_submission_content_order() {
        let tmp = TempDir::new().unwrap();
        let builder = ProjectBuilder::new(tmp.path(), project_config());
        let body = "def orders_clean(data=bauplan.Model('orders')):\n    return data";

        let project = builder
            .build(&Submission::python(body, Some(PipDependency::new("requests", "2.31")), true))
            .await
            .unwrap();

        assert_eq!(project.source_file(), PYTHON_SOURCE_FILE);
        let content = std::fs::read_to_string(project.source_path()).unwrap();

        let materialize_at = content.find("materialize=True").unwrap();
        let pip_at = content.find("'requests': '2.31'").unwrap();
        let body_at = content.find("def orders_clean").unwrap();
        assert!(materialize_at < pip_at);
        assert!(pip_at < body_at);
    }

    #[tokio::test]
    async fn test_manifest_contents() {
        let tmp = TempDir::new().unwrap();
        let builder = ProjectBuilder::new(tmp.path(), project_config());
        let project = builder.build(&Submission::sql("SELECT 1", None, true)).await.unwrap();

        let manifest = std::fs::read_to_string(project.path().join(MANIFEST_FILE)).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&manifest).unwrap();
        assert_eq!(parsed["project"]["name"].as_str(), Some("temp_project"));
        assert_eq!(parsed["project"]["id"].as_str(), Some("5b0f3e52-7c1d-4f6a-9e2b-8d4c1a7f3e90"));
        assert_eq!(parsed["defaults"]["python_version"].as_str(), Some("3.11"));

        assert_eq!(project.source_file(), "model.sql");
    }

    #[tokio::test]
    async fn test_blank_body_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("workspace");
        let builder = ProjectBuilder::new(&root, project_config());

        let err = builder
            .build(&Submission::python("  \n\t ", None, true))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserInputEmpty(_)));
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_invalid_model_name_rejected_before_writing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("workspace");
        let builder = ProjectBuilder::new(&root, project_config());

        for name in ["../escape", "1st", "orders-clean", "a/b"] {
            let err = builder
                .build(&Submission::sql("SELECT 1", Some(name), false))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "name {} accepted", name);
        }
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_each_build_gets_its_own_directory() {
        let tmp = TempDir::new().unwrap();
        let builder = ProjectBuilder::new(tmp.path(), project_config());

        let first = builder.build(&Submission::sql("SELECT 1", Some("first"), false)).await.unwrap();
        let second = builder.build(&Submission::sql("SELECT 2", Some("second"), false)).await.unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(entries(second.path()), vec![MANIFEST_FILE, "second.sql"]);
    }

    #[tokio::test]
    async fn test_rebuild_after_discard_leaves_no_residue() {
        let tmp = TempDir::new().unwrap();
        let builder = ProjectBuilder::new(tmp.path(), project_config());

        let first = builder.build(&Submission::sql("SELECT 1", Some("first"), false)).await.unwrap();
        let first_dir = first.path().to_path_buf();
        first.discard().await.unwrap();

        let second = builder.build(&Submission::sql("SELECT 2", Some("second"), false)).await.unwrap();

        assert!(!first_dir.exists());
        assert_eq!(entries(tmp.path()).len(), 1);
        assert!(!second.path().join("first.sql").exists());
    }

    #[test]
    fn test_model_identifier_rules() {
        assert!(is_model_identifier("orders_clean"));
        assert!(is_model_identifier("_tmp2"));
        assert!(!is_model_identifier(""));
        assert!(!is_model_identifier("9lives"));
        assert!(!is_model_identifier("has space"));
    }
}
