pub mod catalog;
pub mod query;
pub mod session;
pub mod submission;

pub use catalog::*;
pub use query::*;
pub use session::*;
pub use submission::*;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::middleware::AppError;
use crate::config::Config;
use crate::services::catalog::{create_catalog, CatalogClient, QueryEngine};
use crate::services::{
    CatalogService, CommandDagRunner, DagGateway, DagRunner, ProjectBuilder, QueryService,
    SessionState, SubmissionService,
};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<CatalogService>,
    pub queries: Arc<QueryService>,
    pub submissions: Arc<SubmissionService>,
    pub session: Arc<Mutex<SessionState>>,
}

impl AppState {
    /// Wire the pipeline against the configured remote catalog and runner
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let handles = create_catalog(&config.catalog)?;
        let runner = Arc::new(CommandDagRunner::from_config(&config.runner));
        Ok(Self::new(config, handles.catalog, handles.engine, runner))
    }

    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogClient>,
        engine: Arc<dyn QueryEngine>,
        runner: Arc<dyn DagRunner>,
    ) -> Self {
        let catalog_service = CatalogService::new(catalog, config.catalog.excluded_branches.clone());
        let query_service = QueryService::new(engine, config.query.max_rows);
        let builder = ProjectBuilder::new(config.workspace.root.clone(), config.project.clone());
        let submission_service = SubmissionService::new(builder, DagGateway::new(runner));

        Self {
            config,
            catalog: Arc::new(catalog_service),
            queries: Arc::new(query_service),
            submissions: Arc::new(submission_service),
            session: Arc::new(Mutex::new(SessionState::new())),
        }
    }
}
