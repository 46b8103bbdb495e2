//! Events that drive the router

use super::state::ToolResult;
use crate::classifier::IntentClassification;
use crate::llm::ContentBlock;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// A fresh session record is being opened
    SessionOpened,

    /// New external input; one entry per buffered user message
    UserInput { texts: Vec<String> },

    IntentClassified {
        classification: IntentClassification,
    },

    LlmResponse { content: Vec<ContentBlock> },

    /// Every tool call of the batch finished, results in request order
    ToolsComplete { results: Vec<ToolResult> },

    /// The current turn could not continue (LLM failure, classifier contract
    /// violation, unknown tool name)
    TurnFailed { message: String },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionOpened => "session_opened",
            Event::UserInput { .. } => "user_input",
            Event::IntentClassified { .. } => "intent_classified",
            Event::LlmResponse { .. } => "llm_response",
            Event::ToolsComplete { .. } => "tools_complete",
            Event::TurnFailed { .. } => "turn_failed",
        }
    }
}
