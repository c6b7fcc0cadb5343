use std::sync::Arc;
use std::time::Instant;

use crate::api::middleware::AppError;
use crate::models::{abbreviate_query, Branch, FailureReason, QueryOutcome, ResultTable};
use crate::services::catalog::QueryEngine;
use crate::services::query_cache::{CacheKey, PreviewCache};
use crate::validation::SqlValidator;

/// Query pipeline: read-only check, preview cache, remote execution and
/// conversion of remote failures into a failed outcome
pub struct QueryService {
    engine: Arc<dyn QueryEngine>,
    cache: PreviewCache,
    max_rows: usize,
}

impl QueryService {
    pub fn new(engine: Arc<dyn QueryEngine>, max_rows: usize) -> Self {
        Self {
            engine,
            cache: PreviewCache::new(),
            max_rows,
        }
    }

    /// The session cache, for statistics and invalidation
    pub fn cache(&self) -> &PreviewCache {
        &self.cache
    }

    /// Execute a query against a branch.
    ///
    /// Remote failures come back as `QueryOutcome::Failed`; only local problems
    /// (blank text, write statements) are returned as errors, and those are
    /// detected before any remote call.
    pub async fn execute(
        &self,
        query: &str,
        branch: &Branch,
        preview: bool,
    ) -> Result<QueryOutcome, AppError> {
        if query.trim().is_empty() {
            return Err(AppError::UserInputEmpty(
                "No query to run. Please write a query and press Run.".to_string(),
            ));
        }
        SqlValidator::ensure_read_only(query)?;

        let key = CacheKey::new(query, branch, preview);
        if let Some(table) = self.cache.get(&key).await {
            return Ok(QueryOutcome::Table { table, cached: true });
        }

        tracing::info!(
            "Running \"{}\" on branch \"{}\" via {} engine (preview: {})",
            abbreviate_query(query),
            branch,
            self.engine.engine_name(),
            preview
        );
        let start_time = Instant::now();

        let result = self
            .engine
            .execute(query, branch, preview)
            .await
            .and_then(|table| self.check_size(table));

        match result {
            Ok(table) => {
                tracing::info!(
                    "Query returned {} rows in {} ms",
                    table.row_count,
                    start_time.elapsed().as_millis()
                );
                self.cache.put(key, table.clone()).await;
                Ok(QueryOutcome::Table { table, cached: false })
            }
            Err(err) => match FailureReason::classify(&err) {
                Some(reason) => {
                    tracing::warn!("Query on branch {} failed: {}", branch, err);
                    Ok(QueryOutcome::from_remote_error(reason, &err))
                }
                None => Err(err),
            },
        }
    }

    /// Sampled rows of a table, as shown next to its schema
    pub async fn preview_table(&self, branch: &Branch, table: &str) -> Result<QueryOutcome, AppError> {
        let table = table.trim();
        if table.is_empty() {
            return Err(AppError::Validation("Table name cannot be empty".to_string()));
        }

        let sql = format!("SELECT * FROM {}", quote_identifier(table));
        self.execute(&sql, branch, true).await
    }

    fn check_size(&self, table: ResultTable) -> Result<ResultTable, AppError> {
        if table.row_count > self.max_rows {
            return Err(AppError::ResultTooLarge(format!(
                "{} rows returned, display limit is {}",
                table.row_count, self.max_rows
            )));
        }
        Ok(table)
    }
}

/// Double-quote each dot-separated part of a table name, escaping embedded quotes
fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.trim().replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}
