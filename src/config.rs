use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub query: QueryConfig,
    pub workspace: WorkspaceConfig,
    pub project: ProjectConfig,
    pub runner: RunnerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub url: String,
    pub timeout_secs: u64,
    /// Housekeeping branches or user namespaces hidden from the branch picker
    pub excluded_branches: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub max_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
}

/// Identity written into every ephemeral project manifest
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub id: String,
    pub name: String,
    pub python_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub program: String,
    /// Argument templates; `{project_dir}` and `{branch}` are substituted per run
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Try to load from .env file
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("catalog.url", "http://localhost:8910")?
            .set_default("catalog.timeout_secs", 60)?
            .set_default("catalog.excluded_branches", vec!["bauplan-e2e-check"])?
            .set_default("query.max_rows", 10_000)?
            .set_default("workspace.root", "./.explorer-projects")?
            .set_default("project.id", "5b0f3e52-7c1d-4f6a-9e2b-8d4c1a7f3e90")?
            .set_default("project.name", "temp_project")?
            .set_default("project.python_version", "3.11")?
            .set_default("runner.program", "bauplan")?
            .set_default(
                "runner.args",
                vec!["run", "--project-dir", "{project_dir}", "--ref", "{branch}"],
            )?
            .set_default("logging.level", "info")?;

        // Load from environment variables
        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(3000))?;
        }

        if let Ok(catalog_url) = env::var("CATALOG_URL") {
            builder = builder.set_override("catalog.url", catalog_url)?;
        }

        if let Ok(timeout) = env::var("CATALOG_TIMEOUT_SECS") {
            builder = builder.set_override("catalog.timeout_secs", timeout.parse::<u64>().unwrap_or(60))?;
        }

        if let Ok(max_rows) = env::var("QUERY_MAX_ROWS") {
            builder = builder.set_override("query.max_rows", max_rows.parse::<u64>().unwrap_or(10_000))?;
        }

        if let Ok(workspace) = env::var("WORKSPACE_DIR") {
            builder = builder.set_override("workspace.root", workspace)?;
        }

        if let Ok(program) = env::var("DAG_RUNNER_BIN") {
            builder = builder.set_override("runner.program", program)?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
