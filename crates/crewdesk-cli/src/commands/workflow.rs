//! `crewdesk workflow` - Manage the workflow catalog.

use std::path::Path;

use console::style;
use dialoguer::Confirm;

use crewdesk_core::auth::AdminSecret;
use crewdesk_core::error::ServerError;
use crewdesk_core::models::workflow::Workflow;
use crewdesk_core::state::AppState;

use super::print_json;

pub async fn list(state: &AppState) -> Result<(), String> {
    let workflows = state.workflow_store.list().await.map_err(|e| e.to_string())?;
    if workflows.is_empty() {
        println!("No workflows in {}", state.workflow_store.path().display());
        return Ok(());
    }
    for workflow in &workflows {
        let agents: Vec<_> = workflow.agents.iter().map(|a| a.name.as_str()).collect();
        println!(
            "{:<24} {}  {}",
            style(&workflow.id).cyan(),
            workflow.name,
            style(format!("[{}]", agents.join(", "))).dim()
        );
    }
    Ok(())
}

pub async fn show(state: &AppState, id: &str) -> Result<(), String> {
    let workflow = state
        .workflow_store
        .get(id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Workflow '{}' not found", id))?;
    print_json(&workflow)
}

pub fn validate(file: &Path) -> Result<(), String> {
    let workflow = load(file)?;
    println!(
        "✅ {} ({}): {} agent(s), {} task(s)",
        workflow.name,
        workflow.id,
        workflow.agents.len(),
        workflow.tasks.len()
    );
    Ok(())
}

pub async fn import(state: &AppState, file: &Path, replace: bool) -> Result<(), String> {
    let workflow = load(file)?;
    let id = workflow.id.clone();
    let auth = AdminSecret::local_operator();

    let outcome = match state.workflow_store.create(&auth, workflow.clone()).await {
        Err(ServerError::Conflict(_)) if replace => {
            state.workflow_store.update(&auth, &id, workflow).await
        }
        other => other,
    };
    outcome.map_err(|e| match e {
        ServerError::Conflict(msg) => format!("{} (use --replace to overwrite)", msg),
        other => other.to_string(),
    })?;

    println!("📄 Imported workflow '{}' from {}", id, file.display());
    Ok(())
}

pub async fn delete(state: &AppState, id: &str, yes: bool) -> Result<(), String> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete workflow '{}'?", id))
            .default(false)
            .interact()
            .map_err(|e| format!("Failed to read confirmation: {}", e))?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    state
        .workflow_store
        .delete(&AdminSecret::local_operator(), id)
        .await
        .map_err(|e| e.to_string())?;
    println!("🗑  Deleted workflow '{}'", id);
    Ok(())
}

fn load(file: &Path) -> Result<Workflow, String> {
    let workflow = Workflow::from_file(file).map_err(|e| e.to_string())?;
    workflow.validate().map_err(|e| e.to_string())?;
    Ok(workflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init_state;
    use tempfile::TempDir;

    const YAML: &str = r#"
id: tech_writer
name: Tech Writer
agents:
  - name: writer
    role: Writer
    goal: Write
tasks:
  - description: Write about {topic}
    agent: writer
"#;

    #[tokio::test]
    async fn test_import_then_replace() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("wf.yaml");
        std::fs::write(&file, YAML).unwrap();
        let state = init_state(dir.path());

        import(&state, &file, false).await.unwrap();
        let err = import(&state, &file, false).await.unwrap_err();
        assert!(err.contains("--replace"));

        std::fs::write(&file, YAML.replace("Tech Writer", "Renamed")).unwrap();
        import(&state, &file, true).await.unwrap();
        let stored = state.workflow_store.get("tech_writer").await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");

        assert!(dir.path().join("public/workflows.json").exists());
    }

    #[test]
    fn test_validate_rejects_unknown_agent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("wf.yaml");
        std::fs::write(&file, YAML.replace("agent: writer", "agent: ghost")).unwrap();
        assert!(validate(&file).unwrap_err().contains("ghost"));
    }
}
