use std::path::PathBuf;

use crate::auth::Authorized;
use crate::error::ServerError;
use crate::models::workflow_model::{ModelSelection, WorkflowModelConfig};
use crate::store::JsonFile;

/// Per-workflow model selection in `workflow-models.json`.
#[derive(Debug, Clone)]
pub struct WorkflowModelStore {
    file: JsonFile<Vec<WorkflowModelConfig>>,
}

impl WorkflowModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path, Vec::new),
        }
    }

    pub async fn list(&self) -> Result<Vec<WorkflowModelConfig>, ServerError> {
        self.file.read().await
    }

    pub async fn get(&self, workflow_id: &str) -> Result<Option<WorkflowModelConfig>, ServerError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|c| c.workflow_id == workflow_id))
    }

    pub async fn upsert(
        &self,
        _auth: &Authorized,
        config: WorkflowModelConfig,
    ) -> Result<WorkflowModelConfig, ServerError> {
        if config.workflow_id.trim().is_empty() {
            return Err(ServerError::BadRequest("Workflow ID is required".into()));
        }
        self.file
            .update(move |configs| {
                match configs.iter_mut().find(|c| c.workflow_id == config.workflow_id) {
                    Some(existing) => *existing = config.clone(),
                    None => configs.push(config.clone()),
                }
                tracing::info!(
                    "[WorkflowModelStore] Saved model config for '{}'",
                    config.workflow_id
                );
                Ok(config)
            })
            .await
    }

    /// Removing a config that does not exist is not an error.
    pub async fn delete(&self, _auth: &Authorized, workflow_id: &str) -> Result<(), ServerError> {
        let workflow_id = workflow_id.to_string();
        self.file
            .update(move |configs| {
                configs.retain(|c| c.workflow_id != workflow_id);
                Ok(())
            })
            .await
    }

    pub async fn resolve(
        &self,
        workflow_id: &str,
        agent_name: &str,
    ) -> Result<Option<ModelSelection>, ServerError> {
        Ok(self
            .get(workflow_id)
            .await?
            .and_then(|c| c.resolve(agent_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdminSecret;
    use crate::models::workflow_model::AgentModelConfig;
    use tempfile::TempDir;

    fn config(default_model: &str) -> WorkflowModelConfig {
        WorkflowModelConfig {
            workflow_id: "tech_writer".into(),
            default_provider_id: "tuzi".into(),
            default_model: default_model.into(),
            agent_configs: vec![AgentModelConfig {
                agent_name: "editor".into(),
                provider_id: "groq".into(),
                model: "llama-3.3-70b-versatile".into(),
            }],
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowModelStore::new(dir.path().join("m.json"));
        let auth = AdminSecret::local_operator();

        store.upsert(&auth, config("a")).await.unwrap();
        store.upsert(&auth, config("b")).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].default_model, "b");
    }

    #[tokio::test]
    async fn test_resolve() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowModelStore::new(dir.path().join("m.json"));
        let auth = AdminSecret::local_operator();
        store.upsert(&auth, config("claude-sonnet-4.5")).await.unwrap();

        let editor = store.resolve("tech_writer", "editor").await.unwrap().unwrap();
        assert_eq!(editor.provider_id, "groq");
        let writer = store.resolve("tech_writer", "writer").await.unwrap().unwrap();
        assert_eq!(writer.model, "claude-sonnet-4.5");
        assert!(store.resolve("other", "writer").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowModelStore::new(dir.path().join("m.json"));
        let auth = AdminSecret::local_operator();
        store.upsert(&auth, config("a")).await.unwrap();

        store.delete(&auth, "tech_writer").await.unwrap();
        store.delete(&auth, "tech_writer").await.unwrap();
        assert!(store.get("tech_writer").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_workflow_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowModelStore::new(dir.path().join("m.json"));
        let mut cfg = config("a");
        cfg.workflow_id = " ".into();
        assert!(matches!(
            store.upsert(&AdminSecret::local_operator(), cfg).await,
            Err(ServerError::BadRequest(_))
        ));
    }
}
