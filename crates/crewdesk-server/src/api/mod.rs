pub mod auth;
pub mod config;
pub mod llm_providers;
pub mod run_crew;
pub mod workflow_models;
pub mod workflows;

use axum::Router;

use crewdesk_core::state::AppState;

pub use auth::AdminCredential;

/// Build the complete API router with all sub-routes.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(run_crew::router())
        .nest("/api/auth", auth::router())
        .nest("/api/config", config::router())
        .nest("/api/workflows", workflows::router())
        .nest("/api/llm-providers", llm_providers::router())
        .nest("/api/workflow-models", workflow_models::router())
}
