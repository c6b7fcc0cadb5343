// Catalog and query engine traits - the seam to the remote data catalog
use crate::api::middleware::AppError;
use crate::models::{Branch, Column, ResultTable, Table};

/// Read access to branch, table and column metadata in the remote catalog
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// List every branch identifier known to the catalog
    async fn list_branches(&self) -> Result<Vec<String>, AppError>;

    /// List the tables of a branch; `NotFound` if the branch does not exist
    async fn list_tables(&self, branch: &Branch) -> Result<Vec<Table>, AppError>;

    /// Ordered columns of a table; `NotFound` if the table does not exist
    async fn get_schema(&self, branch: &Branch, table: &str) -> Result<Vec<Column>, AppError>;
}

/// Query execution against a branch in the remote engine
#[async_trait::async_trait]
pub trait QueryEngine: Send + Sync {
    /// Run query text against a branch.
    /// `preview` asks the engine for a bounded/sampled execution; the result
    /// shape is the same either way.
    async fn execute(
        &self,
        query: &str,
        branch: &Branch,
        preview: bool,
    ) -> Result<ResultTable, AppError>;

    /// Short name used in logs
    fn engine_name(&self) -> &str;
}
