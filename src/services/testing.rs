// In-memory stand-ins for the remote catalog and the DAG runner, for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::api::middleware::AppError;
use crate::models::{Branch, Column, ResultTable, Table};
use crate::services::catalog::{CatalogClient, QueryEngine};
use crate::services::dag_gateway::{DagRunner, RunReport};

/// Catalog with fixed branches, tables and query answers
#[derive(Default)]
pub struct FakeCatalog {
    pub branches: Vec<String>,
    pub tables: HashMap<String, Vec<(String, Vec<Column>)>>,
    pub answers: HashMap<String, ResultTable>,
    pub unreachable: bool,
    pub query_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(branches: &[&str]) -> Self {
        Self {
            branches: branches.iter().map(|b| b.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_table(mut self, branch: &str, table: &str, columns: Vec<Column>) -> Self {
        self.tables
            .entry(branch.to_string())
            .or_default()
            .push((table.to_string(), columns));
        self
    }

    pub fn with_answer(mut self, query: &str, table: ResultTable) -> Self {
        self.answers.insert(query.to_string(), table);
        self
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), AppError> {
        if self.unreachable {
            Err(AppError::RemoteUnreachable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn branch_tables(&self, branch: &Branch) -> Result<&Vec<(String, Vec<Column>)>, AppError> {
        self.tables
            .get(&branch.to_string())
            .ok_or_else(|| AppError::NotFound(format!("branch '{}'", branch)))
    }
}

#[async_trait::async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_branches(&self) -> Result<Vec<String>, AppError> {
        self.check_reachable()?;
        Ok(self.branches.clone())
    }

    async fn list_tables(&self, branch: &Branch) -> Result<Vec<Table>, AppError> {
        self.check_reachable()?;
        Ok(self
            .branch_tables(branch)?
            .iter()
            .map(|(name, _)| Table { name: name.clone() })
            .collect())
    }

    async fn get_schema(&self, branch: &Branch, table: &str) -> Result<Vec<Column>, AppError> {
        self.check_reachable()?;
        self.branch_tables(branch)?
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.clone())
            .ok_or_else(|| AppError::NotFound(format!("table '{}' on branch '{}'", table, branch)))
    }
}

#[async_trait::async_trait]
impl QueryEngine for FakeCatalog {
    async fn execute(
        &self,
        query: &str,
        branch: &Branch,
        _preview: bool,
    ) -> Result<ResultTable, AppError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.answers
            .get(query)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("query target on branch '{}'", branch)))
    }

    fn engine_name(&self) -> &str {
        "fake"
    }
}

/// Runner that records each handoff and inspects the project on disk
pub struct RecordingRunner {
    pub succeed: bool,
    pub runs: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
}

impl RecordingRunner {
    pub fn new(succeed: bool) -> Self {
        Self {
            succeed,
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DagRunner for RecordingRunner {
    async fn run(&self, project_dir: &Path, branch: &Branch) -> Result<RunReport, AppError> {
        let mut files: Vec<String> = std::fs::read_dir(project_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();

        self.runs
            .lock()
            .unwrap()
            .push((project_dir.to_path_buf(), branch.to_string(), files));

        Ok(RunReport {
            success: self.succeed,
            exit_code: Some(if self.succeed { 0 } else { 1 }),
            stderr_tail: if self.succeed { String::new() } else { "model failed".to_string() },
        })
    }
}
