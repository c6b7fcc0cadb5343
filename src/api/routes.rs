use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{self, AppState};

/// Create router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/branches", get(handlers::list_branches))
        .route("/api/branches/{branch}/tables", get(handlers::list_tables))
        .route(
            "/api/branches/{branch}/tables/{table}/schema",
            get(handlers::get_table_schema),
        )
        .route(
            "/api/branches/{branch}/tables/{table}/preview",
            get(handlers::preview_table),
        )
        .route("/api/branches/{branch}/query", post(handlers::execute_query))
        .route(
            "/api/branches/{branch}/submissions",
            post(handlers::create_submission),
        )
        .route("/api/session", get(handlers::get_session))
        .route("/api/session/user", put(handlers::select_user))
        .route("/api/session/branch", put(handlers::select_branch))
        .route("/api/session/language", put(handlers::set_language))
        .route("/api/session/tables", get(handlers::session_tables))
        .route("/api/session/query", post(handlers::session_query))
        .route("/api/session/submissions", post(handlers::session_submission))
        .route("/api/cache", delete(handlers::clear_cache))
        .route("/api/cache/stats", get(handlers::cache_stats))
        .route("/api/cache/{branch}", delete(handlers::invalidate_branch_cache))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
