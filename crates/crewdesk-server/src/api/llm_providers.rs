//! LLM provider registry API - /api/llm-providers
//!
//! GET    /api/llm-providers            - list, keys masked
//! POST   /api/llm-providers            - create (admin)
//! PUT    /api/llm-providers            - update by body `id` (admin)
//! DELETE /api/llm-providers?id=        - delete (admin)
//! GET    /api/llm-providers/templates  - presets per provider type
//! POST   /api/llm-providers/test       - connection test (admin)
//! GET    /api/llm-providers/{id}       - unmasked record (admin)

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crewdesk_core::error::ServerError;
use crewdesk_core::models::llm_provider::{
    provider_templates, KeyInstructions, LlmProvider, NewProvider, ProviderPatch,
    ProviderTemplate, ProviderWithInstructions,
};
use crewdesk_core::provider_check::{self, ConnectionTest, ConnectionTestOutcome};
use crewdesk_core::state::AppState;

use super::AdminCredential;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_providers)
                .post(create_provider)
                .put(update_provider)
                .delete(delete_provider),
        )
        .route("/templates", get(list_templates))
        .route("/test", post(test_provider))
        .route("/{id}", get(get_provider))
}

async fn list_providers(
    State(state): State<AppState>,
) -> Result<Json<Vec<LlmProvider>>, ServerError> {
    let providers = state.provider_store.list().await?;
    Ok(Json(providers.iter().map(LlmProvider::masked).collect()))
}

async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
    credential: AdminCredential,
) -> Result<Json<LlmProvider>, ServerError> {
    state.admin.authorize(credential.as_deref())?;
    state
        .provider_store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound("Provider not found".into()))
}

async fn create_provider(
    State(state): State<AppState>,
    credential: AdminCredential,
    Json(body): Json<NewProvider>,
) -> Result<Json<ProviderWithInstructions>, ServerError> {
    let auth = state.admin.authorize(credential.as_deref())?;
    let provider = state.provider_store.create(&auth, body).await?;
    let instructions = KeyInstructions::for_provider(
        &provider.id,
        "Provider created successfully. Please set API key via environment variable.",
    );
    Ok(Json(ProviderWithInstructions {
        provider,
        instructions,
    }))
}

async fn update_provider(
    State(state): State<AppState>,
    credential: AdminCredential,
    Json(body): Json<ProviderPatch>,
) -> Result<Json<ProviderWithInstructions>, ServerError> {
    let auth = state.admin.authorize(credential.as_deref())?;
    let provider = state.provider_store.update(&auth, body).await?;
    let instructions = KeyInstructions::for_provider(
        &provider.id,
        "Provider updated successfully. API key should be set via environment variable.",
    );
    Ok(Json(ProviderWithInstructions {
        provider,
        instructions,
    }))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    id: Option<String>,
}

async fn delete_provider(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
    credential: AdminCredential,
) -> Result<Json<serde_json::Value>, ServerError> {
    let auth = state.admin.authorize(credential.as_deref())?;
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Provider ID is required".into()))?;
    state.provider_store.delete(&auth, &id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn list_templates() -> Json<Vec<ProviderTemplate>> {
    Json(provider_templates())
}

async fn test_provider(
    State(state): State<AppState>,
    credential: AdminCredential,
    Json(body): Json<ConnectionTest>,
) -> Result<Json<ConnectionTestOutcome>, ServerError> {
    state.admin.authorize(credential.as_deref())?;
    let outcome = provider_check::test_connection(&state.http, &body).await?;
    Ok(Json(outcome))
}
