//! Whole-catalog API - /api/config
//!
//! GET  /api/config - the raw `workflows.json` document
//! POST /api/config - replace every workflow at once (admin)
//!
//! The admin password may be sent in the body as `password` as well as in
//! the `X-Admin-Password` header.

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use crewdesk_core::error::ServerError;
use crewdesk_core::models::workflow::{Workflow, WorkflowsFile};
use crewdesk_core::state::AppState;

use super::AdminCredential;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_config).post(replace_config))
}

async fn get_config(State(state): State<AppState>) -> Result<Json<WorkflowsFile>, ServerError> {
    Ok(Json(state.workflow_store.load().await?))
}

#[derive(Debug, Deserialize)]
struct ReplaceConfigRequest {
    workflows: Vec<Workflow>,
    #[serde(default)]
    password: Option<String>,
}

async fn replace_config(
    State(state): State<AppState>,
    credential: AdminCredential,
    Json(body): Json<ReplaceConfigRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let presented = credential.as_deref().or(body.password.as_deref());
    let auth = state.admin.authorize(presented)?;

    let count = state.workflow_store.replace_all(&auth, body.workflows).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Configuration updated successfully",
        "count": count,
    })))
}
