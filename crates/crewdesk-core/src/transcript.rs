//! Client-side run state: folds the ordered record stream of one generation
//! run into per-agent transcript entries.
//!
//! Records are applied strictly in arrival order. A new run ([`RunState::begin`])
//! discards everything from the previous one.

use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::{JobResult, ProgressRecord};

/// Appended to the running entry's content when the run fails.
pub const ERROR_MARKER: &str = "\n\n❌ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Waiting,
    Running,
    Completed,
    Error,
}

impl TranscriptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// One agent turn within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTranscript {
    pub agent: String,
    pub content: String,
    pub status: TranscriptStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunState {
    pub entries: Vec<AgentTranscript>,
    pub loading: bool,
    pub result: Option<JobResult>,
    /// Run-level failure message, set whether or not an agent was running.
    pub error: Option<String>,
    /// `task` messages, in order.
    pub activity: Vec<String>,
    finished: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new generation request.
    pub fn begin(&mut self) {
        *self = Self {
            loading: true,
            ..Self::default()
        };
    }

    /// Whether a terminal record (or a lost connection) ended the run.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one record. Returns `Break` once the run is over; later records
    /// are ignored.
    pub fn apply(&mut self, record: &ProgressRecord) -> ControlFlow<()> {
        if self.finished {
            return ControlFlow::Break(());
        }

        match record {
            ProgressRecord::Task { message, .. } => {
                if let Some(message) = message {
                    self.activity.push(message.clone());
                }
            }
            ProgressRecord::Agent { agent, .. } => {
                self.entries.push(AgentTranscript {
                    agent: agent.clone().unwrap_or_else(|| "Unknown Agent".to_string()),
                    content: String::new(),
                    status: TranscriptStatus::Running,
                    timestamp: Utc::now(),
                });
            }
            ProgressRecord::Stream { agent, message } => {
                let agent = agent.as_deref().unwrap_or("Unknown");
                let message = message.as_deref().unwrap_or("");
                if let Some(entry) = self
                    .entries
                    .iter_mut()
                    .rev()
                    .find(|e| e.agent == agent && e.status == TranscriptStatus::Running)
                {
                    entry.content.push_str(message);
                }
            }
            ProgressRecord::Output { agent, .. } => {
                if let Some(agent) = agent {
                    for entry in self
                        .entries
                        .iter_mut()
                        .filter(|e| &e.agent == agent && e.status == TranscriptStatus::Running)
                    {
                        entry.status = TranscriptStatus::Completed;
                    }
                }
            }
            ProgressRecord::Complete { result, .. } => {
                for entry in self
                    .entries
                    .iter_mut()
                    .filter(|e| e.status == TranscriptStatus::Running)
                {
                    entry.status = TranscriptStatus::Completed;
                }
                self.result = Some(result.clone());
                return self.finish();
            }
            ProgressRecord::Error { message } => {
                if let Some(entry) = self
                    .entries
                    .iter_mut()
                    .find(|e| e.status == TranscriptStatus::Running)
                {
                    entry.content.push_str(ERROR_MARKER);
                    entry.content.push_str(message);
                    entry.status = TranscriptStatus::Error;
                }
                self.error = Some(message.clone());
                return self.finish();
            }
        }
        ControlFlow::Continue(())
    }

    /// The stream ended without a terminal record (connection lost).
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.finished {
            return;
        }
        self.error = Some(reason.into());
        self.finish();
    }

    fn finish(&mut self) -> ControlFlow<()> {
        self.loading = false;
        self.finished = true;
        ControlFlow::Break(())
    }
}
