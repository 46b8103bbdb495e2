//! Intent classification
//!
//! One structured-output LLM call per user turn. The model is forced to call
//! a single `classify_intent` tool whose input is the classification; the
//! returned tag is validated against the closed intent set and rejected
//! rather than coerced when it falls outside it.

use crate::llm::{LlmError, LlmRequest, LlmService, ToolChoice, ToolDefinition};
use crate::session::ConversationState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

const CLASSIFY_TOOL: &str = "classify_intent";

/// What the user wants from this turn; one route per variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Question,
    Schedule,
    Review,
    Reschedule,
    Cancel,
    Unclear,
    Leave,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::Question,
        Intent::Schedule,
        Intent::Review,
        Intent::Reschedule,
        Intent::Cancel,
        Intent::Unclear,
        Intent::Leave,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Question => "question",
            Intent::Schedule => "schedule",
            Intent::Review => "review",
            Intent::Reschedule => "reschedule",
            Intent::Cancel => "cancel",
            Intent::Unclear => "unclear",
            Intent::Leave => "leave",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| ClassifyError::UnknownIntent(s.to_string()))
    }
}

/// Result of one classification pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub topic: String,
    pub summary: String,
}

impl IntentClassification {
    /// Validated constructor for the raw structured output
    pub fn from_output(output: &Value) -> Result<Self, ClassifyError> {
        let field = |key: &str| {
            output
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| ClassifyError::Malformed(format!("missing string field '{key}'")))
        };

        Ok(Self {
            intent: field("intent")?.parse()?,
            topic: field("topic")?.to_string(),
            summary: field("summary")?.to_string(),
        })
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model returned no classification")]
    MissingOutput,

    #[error("model returned unknown intent '{0}'")]
    UnknownIntent(String),

    #[error("malformed classification: {0}")]
    Malformed(String),
}

/// Maps the conversation so far to one [`Intent`]
pub struct IntentClassifier {
    llm: Arc<dyn LlmService>,
    prompt: String,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmService>, prompt: impl Into<String>) -> Self {
        Self {
            llm,
            prompt: prompt.into(),
        }
    }

    pub async fn classify(
        &self,
        conversation: &ConversationState,
    ) -> Result<IntentClassification, ClassifyError> {
        let request = conversation
            .to_request(&self.prompt)
            .with_tools(vec![classify_tool()])
            .with_tool_choice(ToolChoice::Tool(CLASSIFY_TOOL.to_string()));

        let response = self.llm.complete(&request).await?;

        let (_, _, output) = response
            .tool_uses()
            .into_iter()
            .find(|(_, name, _)| *name == CLASSIFY_TOOL)
            .ok_or(ClassifyError::MissingOutput)?;

        let classification = IntentClassification::from_output(output)?;
        tracing::debug!(
            intent = %classification.intent,
            topic = %classification.topic,
            "Intent classified"
        );
        Ok(classification)
    }
}

/// Structured-output schema
fn classify_tool() -> ToolDefinition {
    let intents: Vec<&str> = Intent::ALL.iter().map(|i| i.as_str()).collect();
    ToolDefinition {
        name: CLASSIFY_TOOL.to_string(),
        description: "Record the classification of the user's latest request.".to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["intent", "topic", "summary"],
            "properties": {
                "intent": {"type": "string", "enum": intents},
                "topic": {"type": "string", "description": "Short topic of the request"},
                "summary": {"type": "string", "description": "One sentence summary of what the user wants"}
            }
        }),
    }
}

#[cfg(test)]
impl LlmRequest {
    /// Whether this request forces the classification tool
    pub fn is_classification(&self) -> bool {
        self.tool_choice == ToolChoice::Tool(CLASSIFY_TOOL.to_string())
    }
}
