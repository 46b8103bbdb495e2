//! API request and response types

use crate::classifier::IntentClassification;
use crate::runtime::TurnInput;
use crate::session::{Message, SessionRecord};
use crate::state_machine::RouterState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/sessions/:id/turn`: exactly one of the two fields
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: Option<String>,
    pub resume: Option<Vec<String>>,
}

impl TurnRequest {
    pub fn into_input(self) -> Result<TurnInput, String> {
        match (self.text, self.resume) {
            (Some(text), None) => Ok(TurnInput::Message(text)),
            (None, Some(texts)) => Ok(TurnInput::Resume(texts)),
            (Some(_), Some(_)) => Err("Send either 'text' or 'resume', not both".to_string()),
            (None, None) => Err("Missing 'text' or 'resume'".to_string()),
        }
    }
}

/// Stored session as returned by `GET /api/sessions/:id`
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub state: RouterState,
    pub messages: Vec<Message>,
    pub intent: Option<IntentClassification>,
    pub call_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SessionRecord> for SessionResponse {
    fn from(record: SessionRecord) -> Self {
        Self {
            messages: record.conversation.messages().to_vec(),
            intent: record.conversation.intent().cloned(),
            call_count: record.conversation.call_count(),
            id: record.id,
            state: record.state,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
