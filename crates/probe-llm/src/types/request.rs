use serde::{Deserialize, Serialize};
use std::fmt;

use super::Message;

/// Reasoning effort level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    #[default]
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single streaming request a probe run sends.
///
/// Built once at startup and never mutated; `stream` is always requested.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub reasoning_effort: ReasoningEffort,
    pub max_completion_tokens: Option<u32>,
}

impl ProbeRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            reasoning_effort: ReasoningEffort::default(),
            max_completion_tokens: None,
        }
    }

    /// Single-turn request with just a user prompt
    pub fn with_prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(model, vec![Message::human(prompt)])
    }

    pub fn reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = effort;
        self
    }

    pub fn max_completion_tokens(mut self, max_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_tokens);
        self
    }
}
