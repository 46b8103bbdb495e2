//! Conversation state threaded through every router step

use crate::classifier::IntentClassification;
use crate::llm::{ContentBlock, LlmMessage, LlmRequest, MessageRole, SystemContent};
use crate::state_machine::ToolCall;
use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    /// Result of one tool call
    Tool,
    System,
}

/// One role-tagged conversation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Self {
            role: Role::Tool,
            content: vec![ContentBlock::tool_result(tool_use_id, content, is_error)],
        }
    }

    #[cfg(test)]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Concatenated text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool calls requested by this message, in request order
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some(ToolCall::new(id.clone(), name.clone(), input.clone()))
                }
                _ => None,
            })
            .collect()
    }
}

/// Mutable, single-writer conversation record.
///
/// Messages are append-only: there is no API to remove, reorder or edit an
/// entry once pushed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    intent: Option<IntentClassification>,
    call_count: u64,
}

impl ConversationState {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[cfg(test)]
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Message::user(text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn intent(&self) -> Option<&IntentClassification> {
        self.intent.as_ref()
    }

    /// Overwrites the previous classification
    pub fn set_intent(&mut self, classification: IntentClassification) {
        self.intent = Some(classification);
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    pub fn record_llm_call(&mut self) {
        self.call_count += 1;
    }

    /// Build a request with `prompt` as the system prompt followed by the
    /// whole history. System entries in the history are appended to the
    /// system prompt; tool results travel in user turns.
    pub fn to_request(&self, prompt: &str) -> LlmRequest {
        let mut system = vec![SystemContent::new(prompt)];
        let mut messages = Vec::with_capacity(self.messages.len());

        for msg in &self.messages {
            let role = match msg.role {
                Role::System => {
                    system.push(SystemContent::new(msg.text()));
                    continue;
                }
                Role::User | Role::Tool => MessageRole::User,
                Role::Assistant => MessageRole::Assistant,
            };
            messages.push(LlmMessage {
                role,
                content: msg.content.clone(),
            });
        }

        let mut request = LlmRequest::new(prompt, messages);
        request.system = system;
        request
    }
}
