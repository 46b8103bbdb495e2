//! Effects produced by state transitions

use super::state::{ToolCall, ToolResult};
use crate::classifier::{Intent, IntentClassification};
use crate::llm::ContentBlock;
use crate::session::Message;

/// Effects to be executed after a state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append a message to the conversation
    PersistMessage { message: Message },

    /// Persist the session record
    PersistState,

    /// Record the latest classification
    SetIntent {
        classification: IntentClassification,
    },

    /// Tool-less LLM call with the greeting prompt
    RequestGreeting,

    /// Run the intent classifier over the conversation
    ClassifyIntent,

    /// LLM call bound to the route's prompt and tool set
    RequestLlm { intent: Intent },

    /// Run the batch sequentially, in request order
    ExecuteTools { intent: Intent, calls: Vec<ToolCall> },

    /// Yield to the caller until new input arrives
    Suspend,

    /// Surface a failed turn to the caller
    ReportFailure { message: String },

    /// Session is over
    End,
}

impl Effect {
    pub fn persist_user_message(text: impl Into<String>) -> Self {
        Effect::PersistMessage {
            message: Message::user(text),
        }
    }

    pub fn persist_assistant_message(content: Vec<ContentBlock>) -> Self {
        Effect::PersistMessage {
            message: Message::assistant(content),
        }
    }

    pub fn persist_tool_result(result: &ToolResult) -> Self {
        Effect::PersistMessage {
            message: result.to_message(),
        }
    }

    /// Failure results closing every call of an abandoned batch, in request
    /// order, so no `tool_use` is left without its `tool_result`
    pub fn abandon_tool_calls(pending: &[ToolCall]) -> Vec<Self> {
        pending
            .iter()
            .map(|call| Self::persist_tool_result(&ToolResult::failure(call.id.clone())))
            .collect()
    }
}
