//! Connection test for an LLM provider endpoint.
//!
//! Sends a single-message chat completion to `<baseURL>/chat/completions`
//! and reports success only when the response carries at least one choice.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::models::llm_provider::{env_var_name, is_placeholder_key};

const DEFAULT_TEST_MODEL: &str = "gpt-3.5-turbo";
const TEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTest {
    #[serde(rename = "baseURL", default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionTestOutcome {
    pub success: bool,
    pub message: String,
    /// First choice's reply text, if any.
    pub response: String,
}

/// Pick the key to test with: the provider's environment variable first
/// (`OPENAI_API_KEY` as a fallback for `tuzi`), then the supplied key.
/// Missing and placeholder keys are rejected.
pub fn resolve_api_key<F>(
    provider_id: Option<&str>,
    supplied: Option<&str>,
    env: F,
) -> Result<String, ServerError>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = provider_id.and_then(|id| {
        env(&env_var_name(id))
            .filter(|k| !k.is_empty())
            .or_else(|| match id {
                "tuzi" => env("OPENAI_API_KEY").filter(|k| !k.is_empty()),
                _ => None,
            })
    });

    match from_env.or_else(|| supplied.map(str::to_string)) {
        Some(key) if !key.is_empty() && !is_placeholder_key(&key) => Ok(key),
        _ => {
            let var = provider_id
                .map(env_var_name)
                .unwrap_or_else(|| "API_KEY".to_string());
            Err(ServerError::BadRequest(format!(
                "API key is not configured. Set {var} in the environment"
            )))
        }
    }
}

/// Run the connection test against the process environment.
pub async fn test_connection(
    client: &reqwest::Client,
    request: &ConnectionTest,
) -> Result<ConnectionTestOutcome, ServerError> {
    test_connection_with(client, request, |name| std::env::var(name).ok()).await
}

pub async fn test_connection_with<F>(
    client: &reqwest::Client,
    request: &ConnectionTest,
    env: F,
) -> Result<ConnectionTestOutcome, ServerError>
where
    F: Fn(&str) -> Option<String>,
{
    if request.base_url.trim().is_empty() {
        return Err(ServerError::BadRequest("Missing required field: baseURL".into()));
    }
    let api_key = resolve_api_key(
        request.provider_id.as_deref(),
        request.api_key.as_deref(),
        env,
    )?;
    let model = request
        .model
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_TEST_MODEL);
    let url = format!("{}/chat/completions", request.base_url.trim_end_matches('/'));

    let body = serde_json::json!({
        "model": model,
        "messages": [
            { "role": "user", "content": "Hello! This is a connection test." }
        ],
        "max_tokens": 10,
        "temperature": 0.7,
    });

    tracing::info!("[ProviderCheck] Testing {} (model: {})", url, model);

    let response = client
        .post(&url)
        .bearer_auth(&api_key)
        .timeout(TEST_TIMEOUT)
        .json(&body)
        .send()
        .await
        .map_err(|e| ServerError::Upstream(format!("Connection failed: {}", e)))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ServerError::Upstream(format!("Failed to read response body: {}", e)))?;
    let json: Option<serde_json::Value> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        let detail = json
            .as_ref()
            .and_then(|j| {
                j.pointer("/error/message")
                    .or_else(|| j.get("message"))
                    .and_then(|m| m.as_str())
            })
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        return Err(ServerError::BadRequest(format!(
            "API returned an error ({}): {}",
            status.as_u16(),
            detail
        )));
    }

    let choices = json
        .as_ref()
        .and_then(|j| j.get("choices"))
        .and_then(|c| c.as_array())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Unexpected API response format".into()))?;

    let reply = choices[0]
        .pointer("/message/content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(ConnectionTestOutcome {
        success: true,
        message: format!("Connected. Model {} responded.", model),
        response: reply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_key_beats_supplied_key() {
        let key = resolve_api_key(Some("groq"), Some("sk-body"), env(&[("GROQ_API_KEY", "sk-env")]));
        assert_eq!(key.unwrap(), "sk-env");
    }

    #[test]
    fn test_tuzi_falls_back_to_openai_key() {
        let key = resolve_api_key(Some("tuzi"), None, env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(key.unwrap(), "sk-openai");

        let none = resolve_api_key(Some("groq"), None, env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert!(none.is_err());
    }

    #[test]
    fn test_supplied_key_used_without_env() {
        let key = resolve_api_key(None, Some("sk-body"), env(&[]));
        assert_eq!(key.unwrap(), "sk-body");
    }

    #[test]
    fn test_placeholder_or_missing_key_is_rejected() {
        let err = resolve_api_key(Some("tuzi"), Some("your-tuzi-api-key-here"), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
        assert!(err.to_string().contains("TUZI_API_KEY"));

        assert!(resolve_api_key(None, None, env(&[])).is_err());
        assert!(resolve_api_key(None, Some(""), env(&[])).is_err());
    }

    #[tokio::test]
    async fn test_missing_base_url_is_rejected_before_any_request() {
        let client = reqwest::Client::new();
        let request = ConnectionTest {
            api_key: Some("sk-x".into()),
            ..Default::default()
        };
        let err = test_connection_with(&client, &request, env(&[])).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }
}
