pub mod catalog; // Remote catalog and query engine adapters
pub mod catalog_service;
pub mod dag_gateway;
pub mod framing;
pub mod project_builder;
pub mod query_cache; // Session-scoped preview cache
pub mod query_service;
pub mod session;
pub mod submission_service;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog_service::*;
pub use dag_gateway::*;
pub use project_builder::*;
pub use query_cache::*;
pub use query_service::*;
pub use session::*;
pub use submission_service::*;
