use serde::{Deserialize, Serialize};

/// Final payload of a successful job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub title: String,
    pub article: String,
    pub summary: String,
}

/// One structured progress record, keyed by its `type` tag on the wire.
///
/// `complete` and `error` are terminal: exactly one of them closes a job's
/// record sequence, and only the supervisor produces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressRecord {
    Task {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Agent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Stream {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Output {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Complete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        result: JobResult,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Task,
    Agent,
    Stream,
    Output,
    Complete,
    Error,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Agent => "agent",
            Self::Stream => "stream",
            Self::Output => "output",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl ProgressRecord {
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            agent: None,
            message: Some(message.into()),
        }
    }

    pub fn agent(agent: impl Into<String>) -> Self {
        Self::Agent {
            agent: Some(agent.into()),
            message: None,
        }
    }

    pub fn stream(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stream {
            agent: Some(agent.into()),
            message: Some(message.into()),
        }
    }

    pub fn output(agent: impl Into<String>) -> Self {
        Self::Output {
            agent: Some(agent.into()),
            message: None,
        }
    }

    pub fn complete(result: JobResult) -> Self {
        Self::Complete {
            message: Some("Generation complete".to_string()),
            result,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Task { .. } => RecordKind::Task,
            Self::Agent { .. } => RecordKind::Agent,
            Self::Stream { .. } => RecordKind::Stream,
            Self::Output { .. } => RecordKind::Output,
            Self::Complete { .. } => RecordKind::Complete,
            Self::Error { .. } => RecordKind::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    pub fn agent_name(&self) -> Option<&str> {
        match self {
            Self::Task { agent, .. }
            | Self::Agent { agent, .. }
            | Self::Stream { agent, .. }
            | Self::Output { agent, .. } => agent.as_deref(),
            Self::Complete { .. } | Self::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Task { message, .. }
            | Self::Agent { message, .. }
            | Self::Stream { message, .. }
            | Self::Output { message, .. }
            | Self::Complete { message, .. } => message.as_deref(),
            Self::Error { message } => Some(message.as_str()),
        }
    }

    /// JSON encoding used as the SSE `data:` payload.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "message": format!("Failed to encode record: {}", e) })
                .to_string()
        })
    }
}
