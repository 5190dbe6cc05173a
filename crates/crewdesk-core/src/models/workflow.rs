use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// A configured multi-agent workflow, as read by the external generation job.
///
/// Fields this console does not know about are carried through untouched so
/// that editing a workflow never strips job-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub agents: Vec<AgentDef>,
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDef {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub goal: String,
    /// Backstory handed to the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
    /// May contain a `{topic}` placeholder, substituted by the job.
    pub description: String,
    pub agent: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// On-disk shape of `workflows.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowsFile {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

/// Public listing entry: enough for a picker, no prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub agents: Vec<AgentSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    pub role: String,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            agents: Vec::new(),
            tasks: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_agent(mut self, name: &str, role: &str, goal: &str) -> Self {
        self.agents.push(AgentDef {
            name: name.to_string(),
            role: role.to_string(),
            goal: goal.to_string(),
            prompt: None,
            extra: BTreeMap::new(),
        });
        self
    }

    pub fn with_task(mut self, description: &str, agent: &str) -> Self {
        self.tasks.push(TaskDef {
            description: description.to_string(),
            agent: agent.to_string(),
            extra: BTreeMap::new(),
        });
        self
    }

    /// Parse a workflow definition from YAML (JSON is valid YAML too).
    pub fn from_yaml(content: &str) -> Result<Self, ServerError> {
        serde_yaml::from_str(content)
            .map_err(|e| ServerError::BadRequest(format!("Invalid workflow definition: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::BadRequest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn agent(&self, name: &str) -> Option<&AgentDef> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            agents: self
                .agents
                .iter()
                .map(|a| AgentSummary {
                    name: a.name.clone(),
                    role: a.role.clone(),
                })
                .collect(),
        }
    }

    /// Structural checks the job would otherwise trip over at run time.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.id.trim().is_empty() {
            return Err(ServerError::BadRequest("Workflow id is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(ServerError::BadRequest(format!(
                "Workflow '{}' has no name",
                self.id
            )));
        }

        let mut names = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(ServerError::BadRequest(format!(
                    "Workflow '{}' has an agent without a name",
                    self.id
                )));
            }
            if !names.insert(agent.name.as_str()) {
                return Err(ServerError::BadRequest(format!(
                    "Workflow '{}' defines agent '{}' twice",
                    self.id, agent.name
                )));
            }
        }

        for task in &self.tasks {
            if !names.contains(task.agent.as_str()) {
                return Err(ServerError::BadRequest(format!(
                    "Workflow '{}': task references unknown agent '{}'",
                    self.id, task.agent
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> Workflow {
        Workflow::new("tech_writer", "Tech Writer")
            .with_agent("researcher", "Researcher", "Find facts")
            .with_agent("writer", "Writer", "Write the article")
            .with_task("Research {topic}", "researcher")
            .with_task("Write about {topic}", "writer")
    }

    #[test]
    fn test_valid_workflow() {
        assert!(writer().validate().is_ok());
    }

    #[test]
    fn test_task_with_unknown_agent_is_rejected() {
        let wf = writer().with_task("Edit", "editor");
        let err = wf.validate().unwrap_err();
        assert!(err.to_string().contains("unknown agent 'editor'"));
    }

    #[test]
    fn test_blank_id_and_duplicate_agent_are_rejected() {
        assert!(Workflow::new(" ", "x").validate().is_err());
        assert!(Workflow::new("a", "").validate().is_err());
        let dup = writer().with_agent("writer", "Other", "Other");
        assert!(dup.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = r#"{
            "id": "wf",
            "name": "WF",
            "icon": "pen",
            "agents": [{"name": "a", "role": "r", "goal": "g", "tools": ["search"]}],
            "tasks": [{"description": "d", "agent": "a", "expected_output": "text"}]
        }"#;
        let wf: Workflow = serde_json::from_str(raw).unwrap();
        assert_eq!(wf.extra["icon"], "pen");

        let value = serde_json::to_value(&wf).unwrap();
        assert_eq!(value["icon"], "pen");
        assert_eq!(value["agents"][0]["tools"][0], "search");
        assert_eq!(value["tasks"][0]["expected_output"], "text");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_from_yaml() {
        let wf = Workflow::from_yaml(
            r#"
id: marketing_writer
name: Marketing Writer
agents:
  - name: copywriter
    role: Copywriter
    goal: Sell it
    prompt: You write ads.
tasks:
  - description: Write copy for {topic}
    agent: copywriter
"#,
        )
        .unwrap();
        assert_eq!(wf.id, "marketing_writer");
        assert_eq!(wf.agent("copywriter").and_then(|a| a.prompt.as_deref()), Some("You write ads."));
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_summary_omits_prompts() {
        let summary = writer().summary();
        assert_eq!(summary.agents.len(), 2);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["agents"][1], serde_json::json!({"name": "writer", "role": "Writer"}));
    }
}
