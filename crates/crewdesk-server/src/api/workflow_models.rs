//! Per-workflow model selection API - /api/workflow-models
//!
//! GET    /api/workflow-models[?workflowId=]                   - all configs, or one (or null)
//! POST   /api/workflow-models                                 - create or replace (admin)
//! DELETE /api/workflow-models?workflowId=                     - delete (admin)
//! GET    /api/workflow-models/resolve?workflowId=&agentName=  - effective model for an agent

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crewdesk_core::error::ServerError;
use crewdesk_core::models::workflow_model::WorkflowModelConfig;
use crewdesk_core::state::AppState;

use super::AdminCredential;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_configs).post(save_config).delete(delete_config),
        )
        .route("/resolve", get(resolve_model))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowQuery {
    workflow_id: Option<String>,
}

async fn get_configs(
    State(state): State<AppState>,
    Query(query): Query<WorkflowQuery>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let value = match query.workflow_id {
        Some(id) => serde_json::to_value(state.workflow_model_store.get(&id).await?),
        None => serde_json::to_value(state.workflow_model_store.list().await?),
    }
    .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(Json(value))
}

async fn save_config(
    State(state): State<AppState>,
    credential: AdminCredential,
    Json(body): Json<WorkflowModelConfig>,
) -> Result<Json<WorkflowModelConfig>, ServerError> {
    let auth = state.admin.authorize(credential.as_deref())?;
    Ok(Json(state.workflow_model_store.upsert(&auth, body).await?))
}

async fn delete_config(
    State(state): State<AppState>,
    Query(query): Query<WorkflowQuery>,
    credential: AdminCredential,
) -> Result<Json<serde_json::Value>, ServerError> {
    let auth = state.admin.authorize(credential.as_deref())?;
    let workflow_id = query
        .workflow_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Workflow ID is required".into()))?;
    state.workflow_model_store.delete(&auth, &workflow_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveQuery {
    workflow_id: String,
    agent_name: String,
}

async fn resolve_model(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let selection = state
        .workflow_model_store
        .resolve(&query.workflow_id, &query.agent_name)
        .await?;
    Ok(Json(serde_json::json!({ "selection": selection })))
}
