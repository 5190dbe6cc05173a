//! Workflow catalog API - /api/workflows
//!
//! GET    /api/workflows      - list summaries (public)
//! POST   /api/workflows      - create (admin)
//! GET    /api/workflows/{id} - full definition (public)
//! PUT    /api/workflows/{id} - replace (admin)
//! DELETE /api/workflows/{id} - delete (admin)

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crewdesk_core::error::ServerError;
use crewdesk_core::models::workflow::Workflow;
use crewdesk_core::state::AppState;

use super::AdminCredential;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_workflows).post(create_workflow))
        .route(
            "/{id}",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
}

async fn list_workflows(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let workflows = state.workflow_store.list_summaries().await?;
    Ok(Json(serde_json::json!({ "workflows": workflows })))
}

async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ServerError> {
    state
        .workflow_store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Workflow '{}' not found", id)))
}

async fn create_workflow(
    State(state): State<AppState>,
    credential: AdminCredential,
    Json(body): Json<Workflow>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let auth = state.admin.authorize(credential.as_deref())?;
    let workflow = state.workflow_store.create(&auth, body).await?;
    Ok(Json(serde_json::json!({ "workflow": workflow })))
}

async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    credential: AdminCredential,
    Json(body): Json<Workflow>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let auth = state.admin.authorize(credential.as_deref())?;
    let workflow = state.workflow_store.update(&auth, &id, body).await?;
    Ok(Json(serde_json::json!({ "workflow": workflow })))
}

async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    credential: AdminCredential,
) -> Result<Json<serde_json::Value>, ServerError> {
    let auth = state.admin.authorize(credential.as_deref())?;
    state.workflow_store.delete(&auth, &id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
