//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::{ConversationRouter, RouterBuilder};
use crate::calendly::{AvailabilityQuery, Booking, CalendlyError, SchedulingService};
use crate::llm::{ContentBlock, LlmError, LlmRequest, LlmResponse, LlmService, Usage};
use crate::prompts::Prompts;
use crate::session::MemoryStore;
use crate::tools::{IntentToolTable, Tool, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
    next_call_id: AtomicUsize,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            next_call_id: AtomicUsize::new(1),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, content: Vec<ContentBlock>) {
        self.responses.lock().unwrap().push_back(Ok(LlmResponse {
            content,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
        }));
    }

    /// Queue a plain text reply
    pub fn queue_text(&self, text: &str) {
        self.queue_response(vec![ContentBlock::text(text)]);
    }

    /// Queue one assistant message requesting `calls` in order; ids are
    /// `call_1`, `call_2`, ... across the whole mock
    pub fn queue_tool_calls(&self, calls: Vec<(&str, Value)>) {
        let content = calls
            .into_iter()
            .map(|(name, input)| {
                let n = self.next_call_id.fetch_add(1, Ordering::SeqCst);
                ContentBlock::tool_use(format!("call_{n}"), name, input)
            })
            .collect();
        self.queue_response(content);
    }

    /// Queue the structured output of the intent classifier
    pub fn queue_classification(&self, intent: &str, topic: &str, summary: &str) {
        self.queue_response(vec![ContentBlock::tool_use(
            "classify",
            "classify_intent",
            json!({"intent": intent, "topic": topic, "summary": summary}),
        )]);
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pending(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Stub scheduling service
// ============================================================================

/// Scheduling service with canned records; every call is recorded as
/// `(operation, arguments)`
pub struct StubScheduling {
    calls: Mutex<Vec<(String, Value)>>,
    failure: Option<u16>,
}

impl StubScheduling {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Every operation fails with `status`
    pub fn failing(status: u16) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(status),
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }

    fn record(&self, op: &str, args: Value, response: Value) -> Result<Value, CalendlyError> {
        self.calls.lock().unwrap().push((op.to_string(), args));
        match self.failure {
            Some(status) => Err(CalendlyError::Api {
                method: "GET",
                url: format!("https://stub.invalid/{op}"),
                status,
                body: "stubbed failure".to_string(),
            }),
            None => Ok(response),
        }
    }
}

impl Default for StubScheduling {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchedulingService for StubScheduling {
    async fn get_current_user(&self) -> Result<Value, CalendlyError> {
        self.record(
            "get_current_user",
            json!({}),
            json!({"user": "xyz", "organization": "xyz"}),
        )
    }

    async fn list_event_types(
        &self,
        organization: Option<&str>,
        user: Option<&str>,
    ) -> Result<Value, CalendlyError> {
        self.record(
            "list_event_types",
            json!({"organization": organization, "user": user}),
            json!([{"event_type": "1", "event_name": "Dental"}]),
        )
    }

    async fn list_scheduled_events(
        &self,
        user: Option<&str>,
        organization: Option<&str>,
        count: u32,
        status: Option<&str>,
    ) -> Result<Value, CalendlyError> {
        self.record(
            "list_scheduled_events",
            json!({"user": user, "organization": organization, "count": count, "status": status}),
            json!([{
                "uri": "https://api.calendly.com/scheduled_events/ABC123",
                "event_name": "Dental",
                "status": "active",
                "start_time": "2026-02-14T10:00:00Z",
                "end_time": "2026-02-14T10:30:00Z",
                "location": {"type": "zoom"},
                "created_at": "2026-01-10T09:00:00Z",
                "updated_at": "2026-01-10T09:00:00Z"
            }]),
        )
    }

    async fn list_event_invitees(&self, event_uri: &str) -> Result<Value, CalendlyError> {
        self.record(
            "list_event_invitees",
            json!({"event_uri": event_uri}),
            json!([{
                "uri": "https://api.calendly.com/scheduled_events/ABC123/invitees/INV1",
                "email": "test@foo.com",
                "name": "Test Test",
                "status": "active"
            }]),
        )
    }

    async fn create_invitee_no_show(&self, invitee_uri: &str) -> Result<Value, CalendlyError> {
        self.record(
            "create_invitee_no_show",
            json!({"invitee_uri": invitee_uri}),
            json!({"invitee": invitee_uri}),
        )
    }

    async fn list_event_type_available_times(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<Value, CalendlyError> {
        self.record(
            "list_event_type_available_times",
            json!({
                "event_type": query.event_type,
                "start_time": query.start_time,
                "end_time": query.end_time,
                "timezone": query.timezone,
                "extra": query.extra,
            }),
            json!([
                {
                    "start_time": "2030-01-01T10:00:00Z",
                    "end_time": "2030-01-01T10:30:00Z",
                    "event_type": "1",
                    "event_name": "Dental"
                },
                {
                    "start_time": "2030-01-01T10:30:00Z",
                    "end_time": "2030-01-01T11:00:00Z",
                    "event_type": "1",
                    "event_name": "Dental"
                }
            ]),
        )
    }

    async fn create_invitee(&self, booking: &Booking) -> Result<Value, CalendlyError> {
        self.record(
            "create_invitee",
            json!({
                "event_type": booking.event_type,
                "start_time": booking.start_time,
                "invitee": booking.invitee,
                "location": booking.location,
            }),
            json!({"status": "Appointment scheduled"}),
        )
    }

    async fn cancel_event(&self, event_uuid: &str) -> Result<Value, CalendlyError> {
        self.record(
            "cancel_event",
            json!({"event_uuid": event_uuid}),
            json!({"status": "Appointment canceled"}),
        )
    }
}

// ============================================================================
// Recording tool
// ============================================================================

/// Tool with a fixed outcome that records every input it receives
pub struct RecordingTool {
    name: String,
    outcome: Result<Value, String>,
    inputs: Mutex<Vec<Value>>,
}

impl RecordingTool {
    pub fn ok(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            outcome: Ok(value),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: Err(message.to_string()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<Value> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("Mock {}", self.name)
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn run(&self, input: Value) -> Result<Value, ToolError> {
        self.inputs.lock().unwrap().push(input);
        self.outcome.clone().map_err(ToolError::Validation)
    }
}

// ============================================================================
// Test router
// ============================================================================

/// Router wired to mocks, with handles to inspect them
pub struct TestRouter {
    pub router: ConversationRouter,
    pub llm: Arc<MockLlmClient>,
    pub scheduling: Arc<StubScheduling>,
    pub store: Arc<MemoryStore>,
}

pub struct TestRouterBuilder {
    greet: bool,
    tools: Option<IntentToolTable>,
    scheduling: Arc<StubScheduling>,
}

impl TestRouterBuilder {
    /// Standard tool bindings over [`StubScheduling`], no greeting
    pub fn new() -> Self {
        Self {
            greet: false,
            tools: None,
            scheduling: Arc::new(StubScheduling::new()),
        }
    }

    pub fn greet(mut self, greet: bool) -> Self {
        self.greet = greet;
        self
    }

    pub fn tools(mut self, tools: IntentToolTable) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn scheduling(mut self, scheduling: StubScheduling) -> Self {
        self.scheduling = Arc::new(scheduling);
        self
    }

    pub fn build(self) -> TestRouter {
        let llm = Arc::new(MockLlmClient::new());
        let store = Arc::new(MemoryStore::new());
        let client: Arc<dyn SchedulingService> = self.scheduling.clone();
        let tools = self
            .tools
            .unwrap_or_else(|| IntentToolTable::standard(&client));

        let router = RouterBuilder::new(llm.clone(), store.clone())
            .tools(tools)
            .prompts(Prompts::builtin())
            .greet(self.greet)
            .build();

        TestRouter {
            router,
            llm,
            scheduling: self.scheduling,
            store,
        }
    }
}

impl Default for TestRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Intent;
    use crate::runtime::{RouterError, TurnInput, TurnStatus};
    use crate::session::{Role, SessionRecord, SessionStore};
    use crate::state_machine::{RouterState, ToolCall, TransitionError};
    use crate::tools::{question_tools, ToolSet};

    fn message(text: &str) -> TurnInput {
        TurnInput::Message(text.to_string())
    }

    /// `(tool_use_id, payload, is_error)` of every tool result message
    fn tool_results(messages: &[crate::session::Message]) -> Vec<(String, Value, bool)> {
        messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .flat_map(|m| m.content.iter())
            .filter_map(|block| match block {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => Some((
                    tool_use_id.clone(),
                    serde_json::from_str(content).unwrap(),
                    *is_error,
                )),
                _ => None,
            })
            .collect()
    }

    /// `tool_use` ids sent in `request` without a matching `tool_result`
    fn unanswered_tool_uses(request: &LlmRequest) -> Vec<String> {
        let blocks: Vec<&ContentBlock> = request.messages.iter().flat_map(|m| &m.content).collect();
        blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, .. } => Some(id.clone()),
                _ => None,
            })
            .filter(|id| {
                !blocks.iter().any(|block| {
                    matches!(block, ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == id)
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_review_without_matching_events_uses_no_tools() {
        let t = TestRouterBuilder::new().build();
        t.llm
            .queue_classification("review", "appointments", "wants their appointments");
        t.llm
            .queue_text("I couldn't find any appointments. Could you share your email?");

        let outcome = t
            .router
            .handle_turn("s1", message("What are my appointments?"))
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::AwaitingInput);
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.messages[0].role, Role::User);
        assert!(outcome.messages[1].tool_calls().is_empty());
        assert!(t.scheduling.calls().is_empty());
        assert_eq!(outcome.intent.map(|c| c.intent), Some(Intent::Review));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_schedule_lookup_sequence() {
        let t = TestRouterBuilder::new().build();
        t.llm
            .queue_classification("schedule", "checkup", "free slot on 2030-01-01");
        t.llm
            .queue_tool_calls(vec![("get_calendly_current_user", json!({}))]);
        t.llm.queue_tool_calls(vec![(
            "list_calendly_event_types",
            json!({"input_str": r#"{"user": "xyz", "organization": "xyz"}"#}),
        )]);
        t.llm.queue_tool_calls(vec![(
            "list_calendly_event_type_available_times",
            json!({"input_str": r#"{"event_type": "1", "start_time": "2030-01-01T00:00:00Z", "end_time": "2030-01-01T23:59:59Z"}"#}),
        )]);
        t.llm
            .queue_text("We have slots at 10:00 and 10:30 on January 1st 2030.");

        let outcome = t
            .router
            .handle_turn(
                "s1",
                message("Do you have a free appointment slot on January 1st 2030 for a Dental checkup"),
            )
            .await
            .unwrap();

        assert_eq!(
            t.scheduling.call_names(),
            vec![
                "get_current_user",
                "list_event_types",
                "list_event_type_available_times"
            ]
        );
        assert_eq!(outcome.status, TurnStatus::AwaitingInput);
        // user, then three (assistant, tool) pairs, then the final answer
        assert_eq!(outcome.messages.len(), 8);
        assert!(outcome.messages[7].tool_calls().is_empty());

        let results = tool_results(&outcome.messages);
        assert_eq!(
            results.iter().map(|r| r.0.as_str()).collect::<Vec<_>>(),
            vec!["call_1", "call_2", "call_3"]
        );
        assert_eq!(results[0].1["result"]["user"], "xyz");
        assert_eq!(results[0].1["type"], "json");

        // every route call sees the route's tools and prompt
        let requests = t.llm.requests();
        assert_eq!(requests.len(), 5);
        assert!(requests[0].is_classification());
        assert_eq!(requests[1].tools.len(), 4);
        assert!(requests[1].system[0].text.contains("schedul"));

        let record = t.store.load("s1").await.unwrap().unwrap();
        assert_eq!(record.conversation.call_count(), 5);
        assert_eq!(record.state, RouterState::AwaitingInput);
    }

    #[tokio::test]
    async fn test_malformed_tool_input_records_failure_sentinel() {
        let t = TestRouterBuilder::new().build();
        t.llm.queue_classification("schedule", "slot", "wants a slot");
        t.llm.queue_tool_calls(vec![(
            "list_calendly_event_type_available_times",
            json!("{not valid"),
        )]);
        t.llm.queue_text("Which day would you like?");

        let outcome = t
            .router
            .handle_turn("s1", message("any slot?"))
            .await
            .unwrap();

        assert!(t.scheduling.calls().is_empty());
        let results = tool_results(&outcome.messages);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, json!({"result": "tool failed", "type": "json"}));
        assert!(results[0].2);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.status, TurnStatus::AwaitingInput);
    }

    #[tokio::test]
    async fn test_cancel_sequence() {
        let t = TestRouterBuilder::new().build();
        t.llm
            .queue_classification("cancel", "appointment", "cancel 2030-01-01");
        t.llm
            .queue_tool_calls(vec![("get_calendly_current_user", json!({}))]);
        t.llm.queue_tool_calls(vec![(
            "list_calendly_scheduled_events",
            json!({"input_str": r#"{"user": "xyz", "organization": "xyz"}"#}),
        )]);
        t.llm.queue_tool_calls(vec![(
            "list_calendly_event_invitees",
            json!({"event_uri": "https://api.calendly.com/scheduled_events/ABC123"}),
        )]);
        t.llm.queue_tool_calls(vec![(
            "cancel_calendly_event",
            json!({"input_str": r#"{"event_uuid": "ABC123"}"#}),
        )]);
        t.llm.queue_text("Your appointment has been cancelled.");

        let outcome = t
            .router
            .handle_turn(
                "s1",
                message(
                    "I'd like to cancel my appointment on January 1st, 2030. \
                     My name is 'Test Test' and my email is 'test@foo.com'",
                ),
            )
            .await
            .unwrap();

        assert_eq!(
            t.scheduling.call_names(),
            vec![
                "get_current_user",
                "list_scheduled_events",
                "list_event_invitees",
                "cancel_event"
            ]
        );
        assert_eq!(t.scheduling.calls()[3].1, json!({"event_uuid": "ABC123"}));
        assert_eq!(outcome.reply().as_deref(), Some("Your appointment has been cancelled."));
        assert_eq!(t.llm.pending(), 0);
    }

    #[tokio::test]
    async fn test_batch_continues_past_failing_call() {
        let broken = Arc::new(RecordingTool::failing("first", "boom"));
        let working = Arc::new(RecordingTool::ok("second", json!({"ok": true})));
        let tools = IntentToolTable::empty().with(
            Intent::Schedule,
            ToolSet::new(vec![broken.clone() as Arc<dyn Tool>, working.clone()]),
        );
        let t = TestRouterBuilder::new().tools(tools).build();

        t.llm.queue_classification("schedule", "t", "s");
        t.llm.queue_tool_calls(vec![
            ("first", json!({"a": 1})),
            ("second", json!({"b": 2})),
        ]);
        t.llm.queue_text("done");

        let outcome = t.router.handle_turn("s1", message("go")).await.unwrap();

        assert_eq!(broken.inputs(), vec![json!({"a": 1})]);
        assert_eq!(working.inputs(), vec![json!({"b": 2})]);

        let results = tool_results(&outcome.messages);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "call_1");
        assert!(results[0].2);
        assert_eq!(results[1].0, "call_2");
        assert_eq!(results[1].1, json!({"result": {"ok": true}, "type": "json"}));
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_turn_before_running_batch() {
        let known = Arc::new(RecordingTool::ok("known", json!(1)));
        let tools = IntentToolTable::empty()
            .with(Intent::Review, ToolSet::new(vec![known.clone() as Arc<dyn Tool>]));
        let t = TestRouterBuilder::new().tools(tools).build();

        t.llm.queue_classification("review", "t", "s");
        t.llm
            .queue_tool_calls(vec![("known", json!({})), ("bash", json!({"cmd": "ls"}))]);

        let outcome = t.router.handle_turn("s1", message("hi")).await.unwrap();

        let error = outcome.error.unwrap();
        assert!(error.contains("bash"), "{error}");
        assert!(known.inputs().is_empty());
        assert_eq!(outcome.status, TurnStatus::AwaitingInput);
        // nothing rolled back: the request stays in the log, and each call
        // is closed with the failure sentinel
        assert_eq!(outcome.messages.len(), 4);
        assert_eq!(outcome.messages[1].tool_calls().len(), 2);
        let results = tool_results(&outcome.messages);
        assert_eq!(
            results.iter().map(|r| r.0.as_str()).collect::<Vec<_>>(),
            vec!["call_1", "call_2"]
        );
        assert!(results.iter().all(|r| r.2 && r.1["result"] == "tool failed"));

        t.llm.queue_classification("question", "t", "s");
        t.llm.queue_text("How can I help?");
        let retried = t.router.handle_turn("s1", message("hello?")).await.unwrap();
        assert!(retried.error.is_none());
        for request in &t.llm.requests()[2..] {
            assert!(unanswered_tool_uses(request).is_empty());
        }
    }

    #[tokio::test]
    async fn test_llm_failure_keeps_state_and_next_turn_proceeds() {
        let t = TestRouterBuilder::new().build();
        t.llm.queue_classification("question", "hours", "opening hours");
        t.llm.queue_error(LlmError::server_error("overloaded"));

        let failed = t
            .router
            .handle_turn("s1", message("When are you open?"))
            .await
            .unwrap();
        assert!(failed.error.unwrap().contains("overloaded"));
        assert_eq!(failed.status, TurnStatus::AwaitingInput);
        assert_eq!(failed.messages.len(), 1);

        t.llm.queue_classification("question", "hours", "opening hours");
        t.llm.queue_text("We are open 8am to 6pm.");
        let retried = t
            .router
            .handle_turn("s1", message("Hello?"))
            .await
            .unwrap();
        assert!(retried.error.is_none());
        assert_eq!(retried.messages.len(), 3);
        assert_eq!(retried.messages[0], failed.messages[0]);
    }

    #[tokio::test]
    async fn test_out_of_set_intent_fails_turn() {
        let t = TestRouterBuilder::new().build();
        t.llm.queue_classification("smalltalk", "weather", "chat");

        let outcome = t.router.handle_turn("s1", message("nice day")).await.unwrap();
        assert!(outcome.error.unwrap().contains("smalltalk"));
        assert!(outcome.intent.is_none());
    }

    #[tokio::test]
    async fn test_greeting_on_open() {
        let t = TestRouterBuilder::new().greet(true).build();
        t.llm.queue_text("Welcome to Acme Dental! How can I help?");

        let outcome = t.router.open_session("s1").await.unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].role, Role::Assistant);
        assert_eq!(outcome.status, TurnStatus::AwaitingInput);

        let request = &t.llm.requests()[0];
        assert_eq!(request.system[0].text, Prompts::builtin().greet());
        assert!(request.tools.is_empty());
        assert_eq!(request.messages.len(), 1);

        // opening again does not greet twice
        let again = t.router.open_session("s1").await.unwrap();
        assert_eq!(again.messages.len(), 1);
        assert_eq!(t.llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_first_turn_opens_unknown_session() {
        let t = TestRouterBuilder::new().greet(true).build();
        t.llm.queue_text("Hi, welcome!");
        t.llm.queue_classification("question", "t", "s");
        t.llm.queue_text("Sure.");

        let outcome = t.router.handle_turn("fresh", message("hi")).await.unwrap();
        let roles: Vec<Role> = outcome.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_leave_ends_session() {
        let t = TestRouterBuilder::new().build();
        t.llm.queue_classification("leave", "bye", "done");
        t.llm.queue_text("Goodbye!");

        let outcome = t.router.handle_turn("s1", message("bye")).await.unwrap();
        assert_eq!(outcome.status, TurnStatus::Ended);
        assert!(t.llm.requests()[1].tools.is_empty());

        let err = t
            .router
            .handle_turn("s1", message("wait"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::Transition(TransitionError::SessionEnded)
        ));
        assert_eq!(t.llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_unclear_route_gets_knowledge_base_and_persona() {
        let t = TestRouterBuilder::new().build();
        t.llm.queue_classification("unclear", "?", "unclear");
        t.llm.queue_text("Could you tell me more?");

        t.router.handle_turn("s1", message("hmm")).await.unwrap();

        let request = &t.llm.requests()[1];
        assert_eq!(request.tool_names(), question_tools().names());
        assert_eq!(request.system[0].text, Prompts::builtin().route(Intent::Unclear));
    }

    #[tokio::test]
    async fn test_resume_appends_buffered_messages() {
        let t = TestRouterBuilder::new().build();
        t.llm.queue_classification("question", "t", "s");
        t.llm.queue_text("Yes.");

        let outcome = t
            .router
            .handle_turn(
                "s1",
                TurnInput::Resume(vec!["first".into(), "second".into()]),
            )
            .await
            .unwrap();
        assert_eq!(outcome.messages[0].text(), "first");
        assert_eq!(outcome.messages[1].text(), "second");

        let err = t
            .router
            .handle_turn("s1", TurnInput::Resume(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::Transition(TransitionError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_interrupted_session_recovers_on_load() {
        let t = TestRouterBuilder::new().build();
        let mut record = SessionRecord::new("s1", RouterState::Classifying);
        record.conversation.push_user("lost turn");
        t.store.save(&record).await.unwrap();

        t.llm.queue_classification("question", "t", "s");
        t.llm.queue_text("Answer.");
        let outcome = t.router.handle_turn("s1", message("again")).await.unwrap();

        assert!(outcome.error.is_none());
        assert_eq!(outcome.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_session_interrupted_mid_batch_closes_pending_calls() {
        let t = TestRouterBuilder::new().build();
        let mut record = SessionRecord::new(
            "s1",
            RouterState::ToolExecuting {
                intent: Intent::Review,
                pending: vec![ToolCall::new("x1", "get_calendly_current_user", json!({}))],
            },
        );
        record.conversation.push_user("my bookings");
        record.conversation.push(crate::session::Message::assistant(vec![
            ContentBlock::tool_use("x1", "get_calendly_current_user", json!({})),
        ]));
        t.store.save(&record).await.unwrap();

        t.llm.queue_classification("review", "t", "s");
        t.llm.queue_text("Let me try that again.");
        let outcome = t.router.handle_turn("s1", message("still there?")).await.unwrap();

        assert!(outcome.error.is_none());
        assert!(t.scheduling.calls().is_empty());
        let results = tool_results(&outcome.messages);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "x1");
        assert!(results[0].2);
        for request in t.llm.requests() {
            assert!(unanswered_tool_uses(&request).is_empty());
        }
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_and_not_persisted() {
        let t = TestRouterBuilder::new().build();

        for input in [message("   "), message(""), TurnInput::Resume(vec![" ".into()])] {
            let err = t.router.handle_turn("s1", input).await.unwrap_err();
            assert!(matches!(err, RouterError::Transition(TransitionError::EmptyInput)));
        }

        let record = t.store.load("s1").await.unwrap().unwrap();
        assert!(record.conversation.messages().is_empty());
        assert!(t.llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_session_locks_are_released_after_turns() {
        let t = TestRouterBuilder::new().build();
        t.llm.queue_classification("question", "t", "s");
        t.llm.queue_text("ok");

        t.router.handle_turn("s1", message("hi")).await.unwrap();
        t.router.open_session("s2").await.unwrap();
        t.router.handle_turn("s3", message("  ")).await.unwrap_err();

        assert_eq!(t.router.tracked_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_turns_of_one_session_are_serialized() {
        let t = TestRouterBuilder::new().build();
        for _ in 0..2 {
            t.llm.queue_classification("question", "t", "s");
            t.llm.queue_text("ok");
        }
        let router = Arc::new(t.router);

        let a = tokio::spawn({
            let router = router.clone();
            async move { router.handle_turn("s1", message("one")).await }
        });
        let b = tokio::spawn({
            let router = router.clone();
            async move { router.handle_turn("s1", message("two")).await }
        });

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let record = t.store.load("s1").await.unwrap().unwrap();
        let roles: Vec<Role> = record
            .conversation
            .messages()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn test_stub_failure_becomes_sentinel() {
        let t = TestRouterBuilder::new()
            .scheduling(StubScheduling::failing(500))
            .build();
        t.llm.queue_classification("review", "t", "s");
        t.llm
            .queue_tool_calls(vec![("get_calendly_current_user", json!({}))]);
        t.llm.queue_text("Sorry, something went wrong.");

        let outcome = t.router.handle_turn("s1", message("my bookings")).await.unwrap();
        let results = tool_results(&outcome.messages);
        assert_eq!(results[0].1["result"], "tool failed");
        assert!(outcome.error.is_none());
    }
}
