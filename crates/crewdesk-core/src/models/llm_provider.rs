use serde::{Deserialize, Serialize};

/// Prefix shared by every stored placeholder key.
pub const PLACEHOLDER_PREFIX: &str = "your-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Openai,
    Anthropic,
    Gemini,
    Openrouter,
    Groq,
    Together,
    Fireworks,
    Perplexity,
    Deepseek,
    Kimi,
    Zhipu,
    Qwen,
    Ollama,
    Custom,
}

impl ProviderType {
    pub const ALL: [ProviderType; 14] = [
        Self::Openai,
        Self::Anthropic,
        Self::Gemini,
        Self::Openrouter,
        Self::Groq,
        Self::Together,
        Self::Fireworks,
        Self::Perplexity,
        Self::Deepseek,
        Self::Kimi,
        Self::Zhipu,
        Self::Qwen,
        Self::Ollama,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Openrouter => "openrouter",
            Self::Groq => "groq",
            Self::Together => "together",
            Self::Fireworks => "fireworks",
            Self::Perplexity => "perplexity",
            Self::Deepseek => "deepseek",
            Self::Kimi => "kimi",
            Self::Zhipu => "zhipu",
            Self::Qwen => "qwen",
            Self::Ollama => "ollama",
            Self::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// An OpenAI-compatible endpoint the generation job can call.
///
/// `api_key` on disk is always a placeholder; the real key lives in the
/// environment (see [`env_var_name`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmProvider {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub default_model: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

fn default_enabled() -> bool {
    true
}

/// Body of a create request. Any `apiKey` sent by the client is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProvider {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub default_model: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of an update request: `id` selects the record, every other field
/// present overwrites the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPatch {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub provider_type: Option<ProviderType>,
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    pub models: Option<Vec<String>>,
    pub default_model: Option<String>,
    pub enabled: Option<bool>,
    pub description: Option<String>,
}

impl LlmProvider {
    /// Copy with the key reduced to `***<last4>`.
    pub fn masked(&self) -> Self {
        Self {
            api_key: mask_key(&self.api_key),
            ..self.clone()
        }
    }

    pub fn env_var_name(&self) -> String {
        env_var_name(&self.id)
    }

    pub fn apply(&mut self, patch: ProviderPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(provider_type) = patch.provider_type {
            self.provider_type = provider_type;
        }
        if let Some(base_url) = patch.base_url {
            self.base_url = base_url;
        }
        if let Some(models) = patch.models {
            self.models = models;
        }
        if let Some(default_model) = patch.default_model {
            self.default_model = default_model;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
    }
}

pub fn placeholder_key(provider_id: &str) -> String {
    format!(
        "{PLACEHOLDER_PREFIX}{}-api-key-here",
        provider_id.to_lowercase().replace('_', "-")
    )
}

pub fn is_placeholder_key(key: &str) -> bool {
    key.starts_with(PLACEHOLDER_PREFIX)
}

/// Environment variable holding the real key for a provider.
pub fn env_var_name(provider_id: &str) -> String {
    format!("{}_API_KEY", provider_id.to_uppercase())
}

pub fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = key.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("***{tail}")
}

/// Setup hint returned alongside a created or updated provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInstructions {
    pub message: String,
    pub env_var_name: String,
    pub example: String,
}

impl KeyInstructions {
    pub fn for_provider(provider_id: &str, message: impl Into<String>) -> Self {
        let env_var_name = env_var_name(provider_id);
        Self {
            message: message.into(),
            example: format!("{env_var_name}=your-real-api-key-here"),
            env_var_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderWithInstructions {
    #[serde(flatten)]
    pub provider: LlmProvider,
    #[serde(rename = "_instructions")]
    pub instructions: KeyInstructions,
}

/// Preset endpoint and model list for a provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTemplate {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(rename = "baseURL")]
    pub base_url: &'static str,
    pub models: Vec<&'static str>,
    pub default_model: &'static str,
    pub description: &'static str,
}

pub fn provider_template(provider_type: ProviderType) -> ProviderTemplate {
    use ProviderType::*;

    let (base_url, models, description): (&str, &[&str], &str) = match provider_type {
        Openai => (
            "https://api.openai.com/v1",
            &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo", "o1", "o1-mini"],
            "OpenAI GPT-4o and o1 reasoning models",
        ),
        Anthropic => (
            "https://api.anthropic.com/v1",
            &[
                "claude-sonnet-4-20250514",
                "claude-opus-4-20250514",
                "claude-3-7-sonnet-20250219",
                "claude-3-5-sonnet-20241022",
                "claude-3-5-haiku-20241022",
                "claude-3-opus-20240229",
                "claude-3-haiku-20240307",
            ],
            "Anthropic Claude",
        ),
        Gemini => (
            "https://generativelanguage.googleapis.com/v1beta",
            &[
                "gemini-2.0-flash-exp",
                "gemini-1.5-pro",
                "gemini-1.5-flash",
                "gemini-1.5-flash-8b",
                "gemini-1.0-pro",
            ],
            "Google Gemini, multimodal with long context",
        ),
        Openrouter => (
            "https://openrouter.ai/api/v1",
            &[
                "anthropic/claude-sonnet-4",
                "anthropic/claude-opus-4",
                "openai/gpt-4o",
                "openai/gpt-4-turbo",
                "google/gemini-2.0-flash-exp",
                "meta-llama/llama-3.3-70b-instruct",
                "deepseek/deepseek-chat",
                "qwen/qwen-2.5-72b-instruct",
            ],
            "OpenRouter aggregator",
        ),
        Groq => (
            "https://api.groq.com/openai/v1",
            &[
                "llama-3.3-70b-versatile",
                "llama-3.1-70b-versatile",
                "llama-3.1-8b-instant",
                "mixtral-8x7b-32768",
                "gemma2-9b-it",
            ],
            "Groq low-latency inference",
        ),
        Together => (
            "https://api.together.xyz/v1",
            &[
                "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
                "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo",
                "mistralai/Mixtral-8x7B-Instruct-v0.1",
                "Qwen/Qwen2.5-72B-Instruct-Turbo",
                "deepseek-ai/deepseek-llm-67b-chat",
            ],
            "Together AI hosted open models",
        ),
        Fireworks => (
            "https://api.fireworks.ai/inference/v1",
            &[
                "accounts/fireworks/models/llama-v3p3-70b-instruct",
                "accounts/fireworks/models/llama-v3p1-70b-instruct",
                "accounts/fireworks/models/qwen2p5-72b-instruct",
                "accounts/fireworks/models/deepseek-v3",
            ],
            "Fireworks AI",
        ),
        Perplexity => (
            "https://api.perplexity.ai",
            &[
                "llama-3.1-sonar-large-128k-online",
                "llama-3.1-sonar-small-128k-online",
                "llama-3.1-sonar-large-128k-chat",
                "llama-3.1-sonar-small-128k-chat",
            ],
            "Perplexity search-augmented models",
        ),
        Deepseek => (
            "https://api.deepseek.com/v1",
            &["deepseek-chat", "deepseek-coder"],
            "DeepSeek",
        ),
        Kimi => (
            "https://api.moonshot.cn/v1",
            &[
                "kimi-k2",
                "kimi-k2-0905-preview",
                "kimi-k2-0711-preview",
                "kimi-latest",
                "kimi-thinking-preview",
                "moonshot-v1-8k",
                "moonshot-v1-32k",
                "moonshot-v1-128k",
            ],
            "Kimi (Moonshot AI)",
        ),
        Zhipu => (
            "https://open.bigmodel.cn/api/paas/v4",
            &["glm-4.6", "glm-4.5-flash", "glm-4.5-air", "glm-4.5v", "glm-4v-flash"],
            "Zhipu AI GLM",
        ),
        Qwen => (
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            &["qwen-turbo", "qwen-plus", "qwen-max", "qwen-max-longcontext"],
            "Alibaba Qwen",
        ),
        Ollama => (
            "http://localhost:11434/v1",
            &["llama3.3", "llama3.1", "qwen2.5", "deepseek-r1", "mistral", "gemma2"],
            "Ollama local models",
        ),
        Custom => ("", &[], "Custom OpenAI-compatible API"),
    };

    ProviderTemplate {
        provider_type,
        base_url,
        models: models.to_vec(),
        default_model: models.first().copied().unwrap_or(""),
        description,
    }
}

pub fn provider_templates() -> Vec<ProviderTemplate> {
    ProviderType::ALL.into_iter().map(provider_template).collect()
}

/// Registry contents written when no provider file exists yet.
pub fn default_providers() -> Vec<LlmProvider> {
    vec![LlmProvider {
        id: "tuzi".to_string(),
        name: "Tu-Zi (Claude Sonnet 4.5)".to_string(),
        provider_type: ProviderType::Custom,
        base_url: "https://api.tu-zi.com/v1".to_string(),
        api_key: placeholder_key("tuzi"),
        models: vec!["claude-sonnet-4.5".to_string()],
        default_model: "claude-sonnet-4.5".to_string(),
        enabled: true,
        description: Some("Tu-Zi API (Claude Sonnet 4.5)".to_string()),
        created_at: None,
        updated_at: None,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_key() {
        assert_eq!(placeholder_key("tuzi"), "your-tuzi-api-key-here");
        assert_eq!(
            placeholder_key("My_Provider_1"),
            "your-my-provider-1-api-key-here"
        );
        assert!(is_placeholder_key(&placeholder_key("x")));
        assert!(!is_placeholder_key("sk-live"));
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("tuzi"), "TUZI_API_KEY");
        assert_eq!(env_var_name("provider_17"), "PROVIDER_17_API_KEY");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(""), "");
        assert_eq!(mask_key("sk-abcdef1234"), "***1234");
        assert_eq!(mask_key("ab"), "***ab");
    }

    #[test]
    fn test_provider_wire_format() {
        let json = serde_json::to_value(&default_providers()[0]).unwrap();
        assert_eq!(json["type"], "custom");
        assert_eq!(json["baseURL"], "https://api.tu-zi.com/v1");
        assert_eq!(json["apiKey"], "your-tuzi-api-key-here");
        assert_eq!(json["defaultModel"], "claude-sonnet-4.5");
        assert!(json.get("createdAt").is_none());

        let parsed: LlmProvider = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, default_providers()[0]);
    }

    #[test]
    fn test_templates_cover_every_type() {
        let templates = provider_templates();
        assert_eq!(templates.len(), ProviderType::ALL.len());
        let kimi = provider_template(ProviderType::Kimi);
        assert_eq!(kimi.base_url, "https://api.moonshot.cn/v1");
        assert_eq!(kimi.default_model, "kimi-k2");
        assert_eq!(provider_template(ProviderType::Custom).default_model, "");
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let mut provider = default_providers()[0].clone();
        provider.apply(ProviderPatch {
            id: "tuzi".into(),
            enabled: Some(false),
            ..Default::default()
        });
        assert!(!provider.enabled);
        assert_eq!(provider.name, "Tu-Zi (Claude Sonnet 4.5)");
    }

    #[test]
    fn test_instructions_serialize_beside_provider() {
        let out = ProviderWithInstructions {
            provider: default_providers()[0].clone(),
            instructions: KeyInstructions::for_provider("tuzi", "Set the key"),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["id"], "tuzi");
        assert_eq!(json["_instructions"]["envVarName"], "TUZI_API_KEY");
        assert_eq!(
            json["_instructions"]["example"],
            "TUZI_API_KEY=your-real-api-key-here"
        );
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!(ProviderType::from_str("groq"), Some(ProviderType::Groq));
        assert_eq!(ProviderType::from_str("nope"), None);
    }
}
