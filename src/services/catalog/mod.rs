// Remote catalog access: metadata listing and query execution
pub mod adapter;
pub mod http;

pub use adapter::{CatalogClient, QueryEngine};
pub use http::HttpCatalogClient;

use crate::api::middleware::AppError;
use crate::config::CatalogConfig;
use std::sync::Arc;

/// Handles to the catalog, as metadata client and as query engine
#[derive(Clone)]
pub struct CatalogHandles {
    pub catalog: Arc<dyn CatalogClient>,
    pub engine: Arc<dyn QueryEngine>,
}

/// Factory function to create the catalog adapters from configuration
pub fn create_catalog(config: &CatalogConfig) -> Result<CatalogHandles, AppError> {
    let client = Arc::new(HttpCatalogClient::new(&config.url, config.timeout_secs)?);
    tracing::info!("Using catalog service at {}", config.url);

    Ok(CatalogHandles {
        catalog: client.clone(),
        engine: client,
    })
}
