use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::auth::Authorized;
use crate::error::ServerError;
use crate::models::workflow::{Workflow, WorkflowSummary, WorkflowsFile};
use crate::store::JsonFile;

/// The workflow catalog in `workflows.json`.
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    file: JsonFile<WorkflowsFile>,
}

impl WorkflowStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path, WorkflowsFile::default),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The whole document, as the job sees it.
    pub async fn load(&self) -> Result<WorkflowsFile, ServerError> {
        self.file.read().await
    }

    pub async fn list(&self) -> Result<Vec<Workflow>, ServerError> {
        Ok(self.file.read().await?.workflows)
    }

    pub async fn list_summaries(&self) -> Result<Vec<WorkflowSummary>, ServerError> {
        Ok(self.list().await?.iter().map(Workflow::summary).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Workflow>, ServerError> {
        Ok(self.list().await?.into_iter().find(|w| w.id == id))
    }

    pub async fn create(&self, _auth: &Authorized, workflow: Workflow) -> Result<Workflow, ServerError> {
        workflow.validate()?;
        self.file
            .update(move |doc| {
                if doc.workflows.iter().any(|w| w.id == workflow.id) {
                    return Err(ServerError::Conflict(format!(
                        "Workflow '{}' already exists",
                        workflow.id
                    )));
                }
                tracing::info!("[WorkflowStore] Created workflow '{}'", workflow.id);
                doc.workflows.push(workflow.clone());
                Ok(workflow)
            })
            .await
    }

    /// Replace the workflow stored under `id`. The body may rename the id as
    /// long as the new id is free.
    pub async fn update(
        &self,
        _auth: &Authorized,
        id: &str,
        workflow: Workflow,
    ) -> Result<Workflow, ServerError> {
        workflow.validate()?;
        let id = id.to_string();
        self.file
            .update(move |doc| {
                let index = doc
                    .workflows
                    .iter()
                    .position(|w| w.id == id)
                    .ok_or_else(|| ServerError::NotFound(format!("Workflow '{}' not found", id)))?;
                if workflow.id != id && doc.workflows.iter().any(|w| w.id == workflow.id) {
                    return Err(ServerError::Conflict(format!(
                        "Workflow '{}' already exists",
                        workflow.id
                    )));
                }
                doc.workflows[index] = workflow.clone();
                tracing::info!("[WorkflowStore] Updated workflow '{}'", id);
                Ok(workflow)
            })
            .await
    }

    pub async fn delete(&self, _auth: &Authorized, id: &str) -> Result<(), ServerError> {
        let id = id.to_string();
        self.file
            .update(move |doc| {
                let before = doc.workflows.len();
                doc.workflows.retain(|w| w.id != id);
                if doc.workflows.len() == before {
                    return Err(ServerError::NotFound(format!("Workflow '{}' not found", id)));
                }
                tracing::info!("[WorkflowStore] Deleted workflow '{}'", id);
                Ok(())
            })
            .await
    }

    /// Overwrite the whole catalog.
    pub async fn replace_all(
        &self,
        _auth: &Authorized,
        workflows: Vec<Workflow>,
    ) -> Result<usize, ServerError> {
        let mut seen = HashSet::new();
        for workflow in &workflows {
            workflow.validate()?;
            if !seen.insert(workflow.id.as_str()) {
                return Err(ServerError::BadRequest(format!(
                    "Duplicate workflow id '{}'",
                    workflow.id
                )));
            }
        }
        let count = workflows.len();
        self.file
            .update(move |doc| {
                doc.workflows = workflows;
                Ok(())
            })
            .await?;
        tracing::info!("[WorkflowStore] Replaced catalog with {} workflows", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdminSecret;
    use tempfile::TempDir;

    fn auth() -> Authorized {
        AdminSecret::local_operator()
    }

    fn sample(id: &str) -> Workflow {
        Workflow::new(id, format!("Workflow {id}"))
            .with_agent("writer", "Writer", "Write")
            .with_task("Write about {topic}", "writer")
    }

    fn store(dir: &TempDir) -> WorkflowStore {
        WorkflowStore::new(dir.path().join("public").join("workflows.json"))
    }

    #[tokio::test]
    async fn test_missing_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_get_and_duplicate() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create(&auth(), sample("a")).await.unwrap();

        assert_eq!(store.get("a").await.unwrap().unwrap().name, "Workflow a");
        assert!(store.get("b").await.unwrap().is_none());

        let err = store.create(&auth(), sample("a")).await.unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(matches!(
            store.update(&auth(), "x", sample("x")).await,
            Err(ServerError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&auth(), "x").await,
            Err(ServerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_record() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create(&auth(), sample("a")).await.unwrap();

        let mut changed = sample("a");
        changed.name = "Renamed".into();
        store.update(&auth(), "a", changed).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().unwrap().name, "Renamed");
    }

    #[tokio::test]
    async fn test_invalid_workflow_is_not_written() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let bad = sample("a").with_task("Edit", "editor");
        assert!(matches!(
            store.create(&auth(), bad).await,
            Err(ServerError::BadRequest(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create(&auth(), sample("keep")).await.unwrap();

        let err = store
            .replace_all(&auth(), vec![sample("a"), sample("a")])
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
        assert_eq!(store.list().await.unwrap().len(), 1);

        store
            .replace_all(&auth(), vec![sample("a"), sample("b")])
            .await
            .unwrap();
        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_file_keeps_job_layout() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create(&auth(), sample("a")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("public/workflows.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["workflows"][0]["id"], "a");
        assert_eq!(value["workflows"][0]["tasks"][0]["agent"], "writer");
    }
}
