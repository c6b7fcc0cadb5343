// Catalog service adapter using its HTTP JSON API
// Branch, table and schema listing plus query execution share one client
use crate::api::middleware::AppError;
use crate::models::{Branch, Column, ResultTable, Table};
use crate::services::catalog::adapter::{CatalogClient, QueryEngine};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

pub struct HttpCatalogClient {
    base_url: Url,
    client: Client,
}

#[derive(Debug, Serialize)]
struct EngineQueryRequest<'a> {
    query: &'a str,
    branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct EngineQueryResponse {
    #[serde(default)]
    columns: Vec<EngineColumn>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct EngineColumn {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BranchListResponse {
    #[serde(default)]
    branches: Vec<NamedEntry>,
}

#[derive(Debug, Deserialize)]
struct TableListResponse {
    #[serde(default)]
    tables: Vec<NamedEntry>,
}

#[derive(Debug, Deserialize)]
struct TableDetailResponse {
    #[serde(default)]
    fields: Vec<Column>,
}

impl HttpCatalogClient {
    pub fn new(catalog_url: &str, timeout_secs: u64) -> Result<Self, AppError> {
        let base_url = Url::parse(catalog_url)
            .map_err(|e| AppError::Validation(format!("Invalid catalog URL: {}", e)))?;

        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(AppError::Validation(
                "Catalog URL must use the http:// or https:// scheme".to_string(),
            ));
        }

        // A zero timeout leaves requests unbounded
        let mut builder = Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(std::time::Duration::from_secs(timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    /// Build an endpoint URL below the base URL, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Validation("Catalog URL cannot be used as a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Map a non-success status onto the error taxonomy
    async fn check_status(response: Response, subject: &str) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        Err(match status {
            StatusCode::NOT_FOUND => AppError::NotFound(format!("{} ({})", subject, body)),
            StatusCode::PAYLOAD_TOO_LARGE => AppError::ResultTooLarge(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Rejected(body),
            _ => AppError::RemoteUnreachable(format!("HTTP {}: {}", status, body)),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        subject: &str,
    ) -> Result<T, AppError> {
        let url = self.endpoint(segments)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response, subject).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_branches(&self) -> Result<Vec<String>, AppError> {
        let response: BranchListResponse = self.get_json(&["v0", "branches"], "branch listing").await?;
        Ok(response.branches.into_iter().map(|b| b.name).collect())
    }

    async fn list_tables(&self, branch: &Branch) -> Result<Vec<Table>, AppError> {
        let branch_id = branch.to_string();
        let response: TableListResponse = self
            .get_json(
                &["v0", "branches", branch_id.as_str(), "tables"],
                &format!("branch '{}'", branch_id),
            )
            .await?;
        Ok(response
            .tables
            .into_iter()
            .map(|t| Table { name: t.name })
            .collect())
    }

    async fn get_schema(&self, branch: &Branch, table: &str) -> Result<Vec<Column>, AppError> {
        let branch_id = branch.to_string();
        let response: TableDetailResponse = self
            .get_json(
                &["v0", "branches", branch_id.as_str(), "tables", table],
                &format!("table '{}' on branch '{}'", table, branch_id),
            )
            .await?;
        Ok(response.fields)
    }
}

#[async_trait::async_trait]
impl QueryEngine for HttpCatalogClient {
    async fn execute(
        &self,
        query: &str,
        branch: &Branch,
        preview: bool,
    ) -> Result<ResultTable, AppError> {
        let url = self.endpoint(&["v0", "query"])?;
        let request = EngineQueryRequest {
            query,
            branch: branch.to_string(),
            args: preview.then(|| json!({ "preview": "true" })),
        };

        let response = self.client.post(url).json(&request).send().await?;
        let response =
            Self::check_status(response, &format!("query target on branch '{}'", branch)).await?;
        let engine_response = response.json::<EngineQueryResponse>().await?;

        Ok(ResultTable::new(
            engine_response.columns.into_iter().map(|c| c.name).collect(),
            engine_response.rows,
        ))
    }

    fn engine_name(&self) -> &str {
        "http"
    }
}
