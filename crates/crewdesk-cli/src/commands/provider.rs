//! `crewdesk provider` - Inspect and test LLM providers.

use console::style;

use crewdesk_core::models::llm_provider::provider_templates;
use crewdesk_core::provider_check::{self, ConnectionTest};
use crewdesk_core::state::AppState;

pub async fn list(state: &AppState) -> Result<(), String> {
    let providers = state.provider_store.list().await.map_err(|e| e.to_string())?;
    for provider in providers {
        let env_var = provider.env_var_name();
        let key_set = std::env::var(&env_var).map(|v| !v.is_empty()).unwrap_or(false);
        let key_status = if key_set {
            style(format!("{} set", env_var)).green()
        } else {
            style(format!("{} missing", env_var)).yellow()
        };
        let enabled = if provider.enabled { "" } else { " (disabled)" };

        println!(
            "{:<20} {:<11} {}{}",
            style(&provider.id).cyan(),
            provider.provider_type.as_str(),
            provider.name,
            enabled
        );
        println!(
            "  {}  default: {}  {}",
            style(&provider.base_url).dim(),
            provider.default_model,
            key_status
        );
    }
    Ok(())
}

pub fn templates() -> Result<(), String> {
    for template in provider_templates() {
        println!(
            "{:<11} {:<50} {}",
            style(template.provider_type.as_str()).cyan(),
            template.base_url,
            style(template.description).dim()
        );
    }
    Ok(())
}

pub async fn test(state: &AppState, id: &str, model: Option<&str>) -> Result<(), String> {
    let provider = state
        .provider_store
        .get(id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Provider '{}' not found", id))?;

    let request = ConnectionTest {
        base_url: provider.base_url.clone(),
        api_key: None,
        model: Some(model.unwrap_or(&provider.default_model).to_string()),
        provider_id: Some(provider.id.clone()),
    };

    println!("Testing {} at {}...", provider.name, provider.base_url);
    let outcome = provider_check::test_connection(&state.http, &request)
        .await
        .map_err(|e| e.to_string())?;

    println!("✅ {}", outcome.message);
    if !outcome.response.is_empty() {
        println!("   {}", style(outcome.response).dim());
    }
    Ok(())
}
