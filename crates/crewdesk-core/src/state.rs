use std::sync::Arc;

use crate::auth::AdminSecret;
use crate::config::{DataPaths, JobConfig};
use crate::job::JobSupervisor;
use crate::store::{LlmProviderStore, WorkflowModelStore, WorkflowStore};

/// Shared application state, accessible from handlers and the CLI.
pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub workflow_store: WorkflowStore,
    pub provider_store: LlmProviderStore,
    pub workflow_model_store: WorkflowModelStore,
    pub supervisor: JobSupervisor,
    pub admin: AdminSecret,
    /// Outbound client for provider connection tests.
    pub http: reqwest::Client,
}

impl AppStateInner {
    pub fn new(paths: &DataPaths, job: JobConfig, admin: AdminSecret) -> Self {
        Self {
            workflow_store: WorkflowStore::new(&paths.workflows_file),
            provider_store: LlmProviderStore::new(&paths.providers_file),
            workflow_model_store: WorkflowModelStore::new(&paths.workflow_models_file),
            supervisor: JobSupervisor::new(job),
            admin,
            http: reqwest::Client::new(),
        }
    }
}
