//! Tools exposed to the model
//!
//! Tools are stateless: scheduling tools hold only a handle to the remote
//! service, knowledge-base tools hold nothing. Each route is bound to a fixed
//! [`ToolSet`] through the [`IntentToolTable`], built once per router.

mod args;
mod availability;
mod booking;
mod cancel;
mod event_types;
mod invitees;
mod kb;
mod scheduled;
mod user;

pub use availability::ListAvailableTimesTool;
pub use booking::CreateInviteeTool;
pub use cancel::CancelEventTool;
pub use event_types::ListEventTypesTool;
pub use invitees::ListEventInviteesTool;
pub use kb::{AnswerQuestionTool, ListQuestionsTool, KNOWLEDGE_BASE, NO_ANSWER};
pub use scheduled::ListScheduledEventsTool;
pub use user::GetCurrentUserTool;

use crate::calendly::{CalendlyError, SchedulingService};
use crate::classifier::Intent;
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Why a tool call failed
#[derive(Debug, Error)]
pub enum ToolError {
    /// Required argument missing or malformed; raised before any remote call
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Remote(#[from] CalendlyError),
}

/// Trait for tools that can be executed by a route
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, used for dispatch
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Invoke the tool. Input arrives in whatever shape the model produced.
    async fn run(&self, input: Value) -> Result<Value, ToolError>;
}

/// Ordered set of tools bound to one route
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Get tool definitions for the LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Find a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Knowledge-base tools, bound to the question and unclear routes
pub fn question_tools() -> ToolSet {
    ToolSet::new(vec![Arc::new(ListQuestionsTool), Arc::new(AnswerQuestionTool)])
}

pub fn scheduling_tools(client: &Arc<dyn SchedulingService>) -> ToolSet {
    ToolSet::new(vec![
        Arc::new(GetCurrentUserTool::new(client.clone())),
        Arc::new(ListEventTypesTool::new(client.clone())),
        Arc::new(ListAvailableTimesTool::new(client.clone())),
        Arc::new(CreateInviteeTool::new(client.clone())),
    ])
}

pub fn reviewing_tools(client: &Arc<dyn SchedulingService>) -> ToolSet {
    ToolSet::new(vec![
        Arc::new(GetCurrentUserTool::new(client.clone())),
        Arc::new(ListEventTypesTool::new(client.clone())),
        Arc::new(ListScheduledEventsTool::new(client.clone())),
        Arc::new(ListEventInviteesTool::new(client.clone())),
    ])
}

/// Rescheduling books the new slot and then cancels the old event
pub fn rescheduling_tools(client: &Arc<dyn SchedulingService>) -> ToolSet {
    ToolSet::new(vec![
        Arc::new(GetCurrentUserTool::new(client.clone())),
        Arc::new(ListEventTypesTool::new(client.clone())),
        Arc::new(ListScheduledEventsTool::new(client.clone())),
        Arc::new(ListEventInviteesTool::new(client.clone())),
        Arc::new(ListAvailableTimesTool::new(client.clone())),
        Arc::new(CreateInviteeTool::new(client.clone())),
        Arc::new(CancelEventTool::new(client.clone())),
    ])
}

pub fn cancelling_tools(client: &Arc<dyn SchedulingService>) -> ToolSet {
    ToolSet::new(vec![
        Arc::new(GetCurrentUserTool::new(client.clone())),
        Arc::new(ListScheduledEventsTool::new(client.clone())),
        Arc::new(ListEventInviteesTool::new(client.clone())),
        Arc::new(CancelEventTool::new(client.clone())),
    ])
}

/// Intent to tool set mapping, fixed when the router is built.
///
/// Every intent has an entry; intents never configured get an empty set.
#[derive(Debug, Clone)]
pub struct IntentToolTable {
    sets: HashMap<Intent, ToolSet>,
}

impl IntentToolTable {
    /// Table with no tools for any intent
    pub fn empty() -> Self {
        Self {
            sets: Intent::ALL.iter().map(|i| (*i, ToolSet::empty())).collect(),
        }
    }

    /// The production bindings against a live scheduling service
    pub fn standard(client: &Arc<dyn SchedulingService>) -> Self {
        Self::empty()
            .with(Intent::Question, question_tools())
            .with(Intent::Schedule, scheduling_tools(client))
            .with(Intent::Review, reviewing_tools(client))
            .with(Intent::Reschedule, rescheduling_tools(client))
            .with(Intent::Cancel, cancelling_tools(client))
    }

    /// Bind `tools` to `intent`. Binding `question` binds `unclear` to the
    /// same set; bind `unclear` afterwards to give it its own.
    #[must_use]
    pub fn with(mut self, intent: Intent, tools: ToolSet) -> Self {
        if intent == Intent::Question {
            self.sets.insert(Intent::Unclear, tools.clone());
        }
        self.sets.insert(intent, tools);
        self
    }

    /// Tools bound to the route for `intent`
    pub fn tools_for(&self, intent: Intent) -> &ToolSet {
        // every intent is inserted at construction
        &self.sets[&intent]
    }
}
