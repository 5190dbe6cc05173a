use serde::{Deserialize, Serialize};

/// Model choice for one workflow: a default plus per-agent overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowModelConfig {
    pub workflow_id: String,
    #[serde(default)]
    pub default_provider_id: String,
    #[serde(default)]
    pub default_model: String,
    #[serde(default)]
    pub agent_configs: Vec<AgentModelConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentModelConfig {
    pub agent_name: String,
    pub provider_id: String,
    pub model: String,
}

/// The provider/model pair an agent ends up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelection {
    pub provider_id: String,
    pub model: String,
}

impl WorkflowModelConfig {
    /// Agent override first, then the workflow default. An entry with an
    /// empty provider id does not count.
    pub fn resolve(&self, agent_name: &str) -> Option<ModelSelection> {
        if let Some(agent) = self
            .agent_configs
            .iter()
            .find(|a| a.agent_name == agent_name && !a.provider_id.is_empty())
        {
            return Some(ModelSelection {
                provider_id: agent.provider_id.clone(),
                model: agent.model.clone(),
            });
        }
        if self.default_provider_id.is_empty() {
            return None;
        }
        Some(ModelSelection {
            provider_id: self.default_provider_id.clone(),
            model: self.default_model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WorkflowModelConfig {
        WorkflowModelConfig {
            workflow_id: "tech_writer".into(),
            default_provider_id: "tuzi".into(),
            default_model: "claude-sonnet-4.5".into(),
            agent_configs: vec![AgentModelConfig {
                agent_name: "editor".into(),
                provider_id: "groq".into(),
                model: "llama-3.3-70b-versatile".into(),
            }],
        }
    }

    #[test]
    fn test_agent_override_wins() {
        let selection = config().resolve("editor").unwrap();
        assert_eq!(selection.provider_id, "groq");
        assert_eq!(selection.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_falls_back_to_workflow_default() {
        let selection = config().resolve("writer").unwrap();
        assert_eq!(selection.provider_id, "tuzi");
    }

    #[test]
    fn test_no_default_resolves_to_none() {
        let mut cfg = config();
        cfg.default_provider_id.clear();
        assert!(cfg.resolve("writer").is_none());
        assert!(cfg.resolve("editor").is_some());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(config()).unwrap();
        assert_eq!(json["workflowId"], "tech_writer");
        assert_eq!(json["agentConfigs"][0]["agentName"], "editor");
        assert_eq!(json["agentConfigs"][0]["providerId"], "groq");
    }
}
