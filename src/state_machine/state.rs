//! Router state types

use crate::classifier::Intent;
use crate::session::Message;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Payload recorded for a tool call that raised an error
pub const TOOL_FAILED: &str = "tool failed";

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// Outcome of one tool call, correlated by `tool_use_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub payload: Value,
    pub is_error: bool,
}

impl ToolResult {
    /// `{"result": <value>, "type": "json"}`
    pub fn success(tool_use_id: impl Into<String>, value: Value) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            payload: json!({"result": value, "type": "json"}),
            is_error: false,
        }
    }

    /// Fixed sentinel; the failure detail goes to the log, not the model
    pub fn failure(tool_use_id: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            payload: json!({"result": TOOL_FAILED, "type": "json"}),
            is_error: true,
        }
    }

    /// The tool-role message carrying this result
    pub fn to_message(&self) -> Message {
        Message::tool_result(self.tool_use_id.clone(), self.payload.to_string(), self.is_error)
    }
}

/// Router state, persisted with the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouterState {
    /// Record created, nothing run yet
    #[default]
    New,

    /// Waiting for the greeting LLM call
    Greeting,

    /// Suspended until the next user input
    AwaitingInput,

    /// Waiting for the classifier
    Classifying,

    /// Waiting for the LLM call of the route bound to `intent`
    Routing { intent: Intent },

    /// Running the tool calls of the route's last LLM response
    ToolExecuting {
        intent: Intent,
        pending: Vec<ToolCall>,
    },

    /// Terminal; reached only through the leave route
    Ended,
}

impl RouterState {
    /// States a route is actively running in
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            RouterState::Greeting
                | RouterState::Classifying
                | RouterState::Routing { .. }
                | RouterState::ToolExecuting { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RouterState::Ended)
    }

    /// Short name for logs and API responses
    pub fn name(&self) -> &'static str {
        match self {
            RouterState::New => "new",
            RouterState::Greeting => "greeting",
            RouterState::AwaitingInput => "awaiting_input",
            RouterState::Classifying => "classifying",
            RouterState::Routing { .. } => "routing",
            RouterState::ToolExecuting { .. } => "tool_executing",
            RouterState::Ended => "ended",
        }
    }
}

/// Static configuration a transition may consult
#[derive(Debug, Clone)]
pub struct RouterContext {
    pub session_id: String,
    /// Run the greeting route when a session opens
    pub greet: bool,
}

impl RouterContext {
    pub fn new(session_id: impl Into<String>, greet: bool) -> Self {
        Self {
            session_id: session_id.into(),
            greet,
        }
    }
}
