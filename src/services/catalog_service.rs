use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::middleware::AppError;
use crate::models::{Branch, BranchGroups, Table, TableSchema, UserBranches, BRANCH_SEPARATOR, MAIN_BRANCH};
use crate::services::catalog::CatalogClient;

/// Catalog service for branch, table and schema browsing
pub struct CatalogService {
    catalog: Arc<dyn CatalogClient>,
    excluded_branches: Vec<String>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogClient>, excluded_branches: Vec<String>) -> Self {
        Self {
            catalog,
            excluded_branches,
        }
    }

    /// Raw branch identifiers from the catalog
    pub async fn list_branches(&self) -> Result<Vec<String>, AppError> {
        let branches = self.catalog.list_branches().await.map_err(|e| {
            tracing::error!("Failed to list branches: {}", e);
            e
        })?;
        tracing::debug!("Catalog returned {} branches", branches.len());
        Ok(branches)
    }

    /// Branches grouped by user namespace, housekeeping branches removed
    pub async fn branch_groups(&self) -> Result<BranchGroups, AppError> {
        let branches = self.list_branches().await?;
        Ok(group_branches_by_user(&branches, &self.excluded_branches))
    }

    pub async fn list_tables(&self, branch: &Branch) -> Result<Vec<Table>, AppError> {
        tracing::info!("Listing tables on branch {}", branch);
        self.catalog.list_tables(branch).await
    }

    /// Column names and types of a table, in catalog order
    pub async fn table_schema(&self, branch: &Branch, table: &str) -> Result<TableSchema, AppError> {
        let table = table.trim();
        if table.is_empty() {
            return Err(AppError::Validation("Table name cannot be empty".to_string()));
        }

        tracing::info!("Fetching schema of {} on branch {}", table, branch);
        let columns = self.catalog.get_schema(branch, table).await?;
        Ok(TableSchema::new(branch.clone(), table.to_string(), &columns))
    }
}

/// Partition branch identifiers by the user prefix before the first separator.
///
/// `main` is always its own singleton group. Identifiers whose user prefix or
/// full name is listed in `excluded` never appear. Identifiers that are neither
/// `main` nor `{user}.{name}` are skipped.
pub fn group_branches_by_user(branches: &[String], excluded: &[String]) -> BranchGroups {
    let is_excluded = |s: &str| excluded.iter().any(|e| e == s);

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    grouped.insert(MAIN_BRANCH.to_string(), vec![MAIN_BRANCH.to_string()]);

    for identifier in branches {
        if is_excluded(identifier) {
            continue;
        }

        let Some((user, name)) = identifier.split_once(BRANCH_SEPARATOR) else {
            if identifier != MAIN_BRANCH {
                tracing::warn!("Skipping branch outside any user namespace: {}", identifier);
            }
            continue;
        };

        if user.is_empty() || name.is_empty() {
            tracing::warn!("Skipping malformed branch identifier: {}", identifier);
            continue;
        }
        if user == MAIN_BRANCH || is_excluded(user) {
            continue;
        }

        grouped.entry(user.to_string()).or_default().push(name.to_string());
    }

    BranchGroups {
        users: grouped
            .into_iter()
            .map(|(user, branches)| UserBranches { user, branches })
            .collect(),
    }
}
