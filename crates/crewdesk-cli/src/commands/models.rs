//! `crewdesk models` - Per-workflow model selection.

use crewdesk_core::auth::AdminSecret;
use crewdesk_core::models::workflow_model::{AgentModelConfig, WorkflowModelConfig};
use crewdesk_core::state::AppState;

use super::print_json;

pub async fn show(state: &AppState, workflow_id: Option<&str>) -> Result<(), String> {
    let store = &state.workflow_model_store;
    match workflow_id {
        Some(id) => {
            let config = store.get(id).await.map_err(|e| e.to_string())?;
            print_json(&config)
        }
        None => print_json(&store.list().await.map_err(|e| e.to_string())?),
    }
}

pub async fn set_default(
    state: &AppState,
    workflow_id: &str,
    provider_id: &str,
    model: &str,
) -> Result<(), String> {
    ensure_provider(state, provider_id).await?;
    let mut config = current(state, workflow_id).await?;
    config.default_provider_id = provider_id.to_string();
    config.default_model = model.to_string();
    save(state, config).await
}

pub async fn set_agent(
    state: &AppState,
    workflow_id: &str,
    agent_name: &str,
    provider_id: &str,
    model: &str,
) -> Result<(), String> {
    ensure_provider(state, provider_id).await?;
    let workflow = state
        .workflow_store
        .get(workflow_id)
        .await
        .map_err(|e| e.to_string())?;
    if let Some(workflow) = workflow {
        if workflow.agent(agent_name).is_none() {
            return Err(format!(
                "Workflow '{}' has no agent named '{}'",
                workflow_id, agent_name
            ));
        }
    }

    let mut config = current(state, workflow_id).await?;
    let entry = AgentModelConfig {
        agent_name: agent_name.to_string(),
        provider_id: provider_id.to_string(),
        model: model.to_string(),
    };
    match config
        .agent_configs
        .iter_mut()
        .find(|a| a.agent_name == agent_name)
    {
        Some(existing) => *existing = entry,
        None => config.agent_configs.push(entry),
    }
    save(state, config).await
}

pub async fn resolve(state: &AppState, workflow_id: &str, agent_name: &str) -> Result<(), String> {
    let selection = state
        .workflow_model_store
        .resolve(workflow_id, agent_name)
        .await
        .map_err(|e| e.to_string())?;
    match selection {
        Some(selection) => println!("{} → {} / {}", agent_name, selection.provider_id, selection.model),
        None => println!("{} → job default (no model configured)", agent_name),
    }
    Ok(())
}

pub async fn clear(state: &AppState, workflow_id: &str) -> Result<(), String> {
    state
        .workflow_model_store
        .delete(&AdminSecret::local_operator(), workflow_id)
        .await
        .map_err(|e| e.to_string())?;
    println!("Cleared model configuration for '{}'", workflow_id);
    Ok(())
}

async fn current(state: &AppState, workflow_id: &str) -> Result<WorkflowModelConfig, String> {
    Ok(state
        .workflow_model_store
        .get(workflow_id)
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_else(|| WorkflowModelConfig {
            workflow_id: workflow_id.to_string(),
            default_provider_id: String::new(),
            default_model: String::new(),
            agent_configs: Vec::new(),
        }))
}

async fn ensure_provider(state: &AppState, provider_id: &str) -> Result<(), String> {
    let known = state
        .provider_store
        .get(provider_id)
        .await
        .map_err(|e| e.to_string())?
        .is_some();
    if known {
        Ok(())
    } else {
        Err(format!("Provider '{}' not found", provider_id))
    }
}

async fn save(state: &AppState, config: WorkflowModelConfig) -> Result<(), String> {
    let saved = state
        .workflow_model_store
        .upsert(&AdminSecret::local_operator(), config)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init_state;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_default_then_agent_override() {
        let dir = TempDir::new().unwrap();
        let state = init_state(dir.path());

        set_default(&state, "tech_writer", "tuzi", "claude-sonnet-4.5")
            .await
            .unwrap();
        set_agent(&state, "tech_writer", "editor", "tuzi", "other-model")
            .await
            .unwrap();
        set_agent(&state, "tech_writer", "editor", "tuzi", "final-model")
            .await
            .unwrap();

        let config = state
            .workflow_model_store
            .get("tech_writer")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(config.default_model, "claude-sonnet-4.5");
        assert_eq!(config.agent_configs.len(), 1);
        assert_eq!(config.agent_configs[0].model, "final-model");
    }

    #[tokio::test]
    async fn test_unknown_provider_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = init_state(dir.path());
        let err = set_default(&state, "tech_writer", "ghost", "m").await.unwrap_err();
        assert!(err.contains("ghost"));
    }
}
