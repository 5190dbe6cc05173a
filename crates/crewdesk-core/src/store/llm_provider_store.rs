use std::path::PathBuf;

use chrono::Utc;

use crate::auth::Authorized;
use crate::error::ServerError;
use crate::models::llm_provider::{
    default_providers, is_placeholder_key, placeholder_key, LlmProvider, NewProvider,
    ProviderPatch,
};
use crate::store::JsonFile;

/// The LLM provider registry in `llm-providers.json`.
///
/// Keys are never persisted: every write stores the provider's placeholder.
#[derive(Debug, Clone)]
pub struct LlmProviderStore {
    file: JsonFile<Vec<LlmProvider>>,
}

impl LlmProviderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::seeded(path, default_providers),
        }
    }

    pub async fn list(&self) -> Result<Vec<LlmProvider>, ServerError> {
        self.file.read().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<LlmProvider>, ServerError> {
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }

    pub async fn create(
        &self,
        _auth: &Authorized,
        input: NewProvider,
    ) -> Result<LlmProvider, ServerError> {
        let now = Utc::now().timestamp_millis();
        let id = input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("provider_{}", now));

        let provider = LlmProvider {
            api_key: placeholder_key(&id),
            id,
            name: input.name,
            provider_type: input.provider_type,
            base_url: input.base_url,
            models: input.models,
            default_model: input.default_model,
            enabled: input.enabled,
            description: input.description,
            created_at: Some(now),
            updated_at: Some(now),
        };

        self.file
            .update(move |providers| {
                if providers.iter().any(|p| p.id == provider.id) {
                    return Err(ServerError::Conflict(format!(
                        "Provider '{}' already exists",
                        provider.id
                    )));
                }
                tracing::info!("[LlmProviderStore] Created provider '{}'", provider.id);
                providers.push(provider.clone());
                Ok(provider)
            })
            .await
    }

    pub async fn update(
        &self,
        _auth: &Authorized,
        patch: ProviderPatch,
    ) -> Result<LlmProvider, ServerError> {
        self.file
            .update(move |providers| {
                let provider = providers
                    .iter_mut()
                    .find(|p| p.id == patch.id)
                    .ok_or_else(|| ServerError::NotFound("Provider not found".into()))?;

                if !is_placeholder_key(&provider.api_key) {
                    provider.api_key = placeholder_key(&patch.id);
                }
                provider.apply(patch);
                provider.updated_at = Some(Utc::now().timestamp_millis());
                tracing::info!("[LlmProviderStore] Updated provider '{}'", provider.id);
                Ok(provider.clone())
            })
            .await
    }

    pub async fn delete(&self, _auth: &Authorized, id: &str) -> Result<(), ServerError> {
        let id = id.to_string();
        self.file
            .update(move |providers| {
                let before = providers.len();
                providers.retain(|p| p.id != id);
                if providers.len() == before {
                    return Err(ServerError::NotFound("Provider not found".into()));
                }
                tracing::info!("[LlmProviderStore] Deleted provider '{}'", id);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdminSecret;
    use crate::models::llm_provider::ProviderType;
    use tempfile::TempDir;

    fn auth() -> Authorized {
        AdminSecret::local_operator()
    }

    fn input(id: Option<&str>) -> NewProvider {
        NewProvider {
            id: id.map(str::to_string),
            name: "Groq".into(),
            provider_type: ProviderType::Groq,
            base_url: "https://api.groq.com/openai/v1".into(),
            models: vec!["llama-3.3-70b-versatile".into()],
            default_model: "llama-3.3-70b-versatile".into(),
            enabled: true,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_seeded_with_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config/llm-providers.json");
        let store = LlmProviderStore::new(&path);

        let providers = store.list().await.unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id, "tuzi");
        assert_eq!(providers[0].api_key, "your-tuzi-api-key-here");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_create_stores_placeholder_key() {
        let dir = TempDir::new().unwrap();
        let store = LlmProviderStore::new(dir.path().join("p.json"));

        let created = store.create(&auth(), input(Some("my_groq"))).await.unwrap();
        assert_eq!(created.api_key, "your-my-groq-api-key-here");
        assert!(created.created_at.is_some());

        let raw = std::fs::read_to_string(dir.path().join("p.json")).unwrap();
        assert!(!raw.contains("sk-"));
        assert!(raw.contains("your-my-groq-api-key-here"));
    }

    #[tokio::test]
    async fn test_create_without_id_generates_one() {
        let dir = TempDir::new().unwrap();
        let store = LlmProviderStore::new(dir.path().join("p.json"));
        let created = store.create(&auth(), input(None)).await.unwrap();
        assert!(created.id.starts_with("provider_"));
        assert!(created.id["provider_".len()..].parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let dir = TempDir::new().unwrap();
        let store = LlmProviderStore::new(dir.path().join("p.json"));
        let err = store.create(&auth(), input(Some("tuzi"))).await.unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_leaked_key_with_placeholder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json");
        let mut seeded = default_providers();
        seeded[0].api_key = "sk-real-secret".into();
        std::fs::write(&path, serde_json::to_string(&seeded).unwrap()).unwrap();

        let store = LlmProviderStore::new(&path);
        let updated = store
            .update(
                &auth(),
                ProviderPatch {
                    id: "tuzi".into(),
                    name: Some("Tu-Zi".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Tu-Zi");
        assert_eq!(updated.api_key, "your-tuzi-api-key-here");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let dir = TempDir::new().unwrap();
        let store = LlmProviderStore::new(dir.path().join("p.json"));
        let patch = ProviderPatch {
            id: "ghost".into(),
            ..Default::default()
        };
        assert!(matches!(
            store.update(&auth(), patch).await,
            Err(ServerError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&auth(), "ghost").await,
            Err(ServerError::NotFound(_))
        ));
        store.delete(&auth(), "tuzi").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
