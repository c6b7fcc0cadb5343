use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use crate::api::middleware::AppError;
use crate::config::RunnerConfig;
use crate::models::{Branch, Completion};
use crate::services::project_builder::EphemeralProject;

/// Lines of runner stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 20;

/// What the external runner reported for one project
#[derive(Debug, Clone)]
pub struct RunReport {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stderr_tail: String,
}

/// External tool that executes a project and materializes its outputs on a branch
#[async_trait]
pub trait DagRunner: Send + Sync {
    async fn run(&self, project_dir: &Path, branch: &Branch) -> Result<RunReport, AppError>;
}

/// Runs the DAG runner CLI as a subprocess.
/// `{project_dir}` and `{branch}` in argument templates are substituted per run.
pub struct CommandDagRunner {
    program: String,
    args: Vec<String>,
}

impl CommandDagRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    fn render_args(&self, project_dir: &Path, branch: &Branch) -> Vec<String> {
        let project_dir = project_dir.to_string_lossy();
        let branch = branch.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{project_dir}", &project_dir)
                    .replace("{branch}", &branch)
            })
            .collect()
    }
}

#[async_trait]
impl DagRunner for CommandDagRunner {
    async fn run(&self, project_dir: &Path, branch: &Branch) -> Result<RunReport, AppError> {
        let args = self.render_args(project_dir, branch);
        tracing::info!("Launching {} {}", self.program, args.join(" "));

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                AppError::Internal(format!("Failed to start DAG runner '{}': {}", self.program, e))
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!(target: "dag_runner", "{}", line);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let stderr_tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");

        Ok(RunReport {
            success: output.status.success(),
            exit_code: output.status.code(),
            stderr_tail,
        })
    }
}

/// Hands staged projects to the DAG runner and reports a plain completion status
pub struct DagGateway {
    runner: Arc<dyn DagRunner>,
}

impl DagGateway {
    pub fn new(runner: Arc<dyn DagRunner>) -> Self {
        Self { runner }
    }

    pub async fn submit(&self, project: &EphemeralProject, branch: &Branch) -> Completion {
        tracing::info!("Submitting project {} to branch {}", project.id(), branch);

        match self.runner.run(project.path(), branch).await {
            Ok(report) if report.success => {
                tracing::info!("DAG complete for project {}", project.id());
                Completion::Completed
            }
            Ok(report) => {
                let code = report
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                tracing::warn!("DAG runner failed for project {} (exit {})", project.id(), code);
                Completion::NotCompleted {
                    message: format!("DAG runner exited with {}: {}", code, report.stderr_tail),
                }
            }
            Err(e) => {
                tracing::error!("DAG runner unavailable for project {}: {}", project.id(), e);
                Completion::NotCompleted {
                    message: e.to_string(),
                }
            }
        }
    }
}
