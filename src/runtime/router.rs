//! Conversation router: effect executor over the router state machine

use crate::classifier::{Intent, IntentClassification, IntentClassifier};
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use crate::prompts::Prompts;
use crate::session::{Message, Role, SessionRecord, SessionStore, StoreError};
use crate::state_machine::{
    transition, Effect, Event, RouterContext, RouterState, ToolCall, ToolResult, TransitionError,
};
use crate::tools::{IntentToolTable, Tool};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// The messages API needs one user turn before the greeting can be produced
const OPENING_TURN: &str = "Hello";

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Tool '{name}' is not bound to the {intent} route")]
    UnknownTool { intent: Intent, name: String },
}

/// External input for one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnInput {
    /// A fresh user message
    Message(String),
    /// User messages buffered while the session was suspended
    Resume(Vec<String>),
}

impl TurnInput {
    fn into_texts(self) -> Vec<String> {
        match self {
            TurnInput::Message(text) => vec![text],
            TurnInput::Resume(texts) => texts,
        }
    }
}

/// Where the session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    AwaitingInput,
    Ended,
}

/// Snapshot returned to the caller at the suspension point
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub intent: Option<IntentClassification>,
    pub status: TurnStatus,
    /// Set when the turn failed; state is kept as it was when it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnOutcome {
    fn from_turn(turn: Turn) -> Self {
        let status = if turn.record.state.is_terminal() {
            TurnStatus::Ended
        } else {
            TurnStatus::AwaitingInput
        };
        Self {
            session_id: turn.record.id,
            messages: turn.record.conversation.messages().to_vec(),
            intent: turn.record.conversation.intent().cloned(),
            status,
            error: turn.error,
        }
    }

    /// Text of the newest assistant message
    pub fn reply(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(Message::text)
    }
}

/// A session being driven through one turn
struct Turn {
    record: SessionRecord,
    context: RouterContext,
    error: Option<String>,
}

/// Builder with every collaborator passed in explicitly
pub struct RouterBuilder {
    llm: Arc<dyn LlmService>,
    store: Arc<dyn SessionStore>,
    tools: IntentToolTable,
    prompts: Prompts,
    greet: bool,
}

impl RouterBuilder {
    pub fn new(llm: Arc<dyn LlmService>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            llm,
            store,
            tools: IntentToolTable::empty(),
            prompts: Prompts::builtin(),
            greet: true,
        }
    }

    #[must_use]
    pub fn tools(mut self, tools: IntentToolTable) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    #[must_use]
    pub fn greet(mut self, greet: bool) -> Self {
        self.greet = greet;
        self
    }

    pub fn build(self) -> ConversationRouter {
        let classifier = IntentClassifier::new(self.llm.clone(), self.prompts.intent());
        ConversationRouter {
            llm: self.llm,
            classifier,
            store: self.store,
            tools: self.tools,
            prompts: self.prompts,
            greet: self.greet,
            locks: Mutex::new(HashMap::new()),
        }
    }
}

/// Drives sessions from one suspension point to the next
pub struct ConversationRouter {
    llm: Arc<dyn LlmService>,
    classifier: IntentClassifier,
    store: Arc<dyn SessionStore>,
    tools: IntentToolTable,
    prompts: Prompts,
    greet: bool,
    /// One lock per session id with a turn in flight; turns of a session
    /// never interleave. Entries are dropped once no turn holds them.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConversationRouter {
    pub fn builder(llm: Arc<dyn LlmService>, store: Arc<dyn SessionStore>) -> RouterBuilder {
        RouterBuilder::new(llm, store)
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Open `session_id`, running the greeting route when configured.
    /// Opening an existing session returns its current snapshot.
    pub async fn open_session(&self, session_id: &str) -> Result<TurnOutcome, RouterError> {
        let lock = self.session_lock(session_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.open_locked(session_id).await
        };
        self.release_lock(session_id, lock).await;
        result
    }

    async fn open_locked(&self, session_id: &str) -> Result<TurnOutcome, RouterError> {
        let mut turn = self.load(session_id).await?;
        if turn.record.state == RouterState::New {
            tracing::info!(session_id = %session_id, greet = self.greet, "Opening session");
            self.drive(&mut turn, Event::SessionOpened).await?;
        }
        Ok(TurnOutcome::from_turn(turn))
    }

    /// Feed one turn of user input and run until the session suspends or ends.
    /// An unknown session is opened first.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        input: TurnInput,
    ) -> Result<TurnOutcome, RouterError> {
        let lock = self.session_lock(session_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.turn_locked(session_id, input).await
        };
        self.release_lock(session_id, lock).await;
        result
    }

    async fn turn_locked(
        &self,
        session_id: &str,
        input: TurnInput,
    ) -> Result<TurnOutcome, RouterError> {
        let mut turn = self.load(session_id).await?;
        if turn.record.state == RouterState::New {
            self.drive(&mut turn, Event::SessionOpened).await?;
        }

        let texts = input.into_texts();
        tracing::info!(session_id = %session_id, inputs = texts.len(), "Handling turn");
        self.drive(&mut turn, Event::UserInput { texts }).await?;

        Ok(TurnOutcome::from_turn(turn))
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Drop the map entry unless another turn is waiting on it
    async fn release_lock(&self, session_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks
            .get(session_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(session_id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn tracked_sessions(&self) -> usize {
        self.locks.lock().await.len()
    }

    async fn load(&self, session_id: &str) -> Result<Turn, RouterError> {
        let record = match self.store.load(session_id).await? {
            Some(mut record) => {
                // A busy state on load means the process died mid-route
                if record.state.is_busy() {
                    tracing::warn!(
                        session_id = %session_id,
                        state = record.state.name(),
                        "Recovering interrupted session"
                    );
                    if let RouterState::ToolExecuting { pending, .. } = &record.state {
                        for call in pending {
                            record
                                .conversation
                                .push(ToolResult::failure(call.id.clone()).to_message());
                        }
                    }
                    record.state = RouterState::AwaitingInput;
                    record.touch();
                    self.store.save(&record).await?;
                }
                record
            }
            None => SessionRecord::new(session_id, RouterState::New),
        };

        Ok(Turn {
            context: RouterContext::new(session_id, self.greet),
            record,
            error: None,
        })
    }

    /// Run events through the state machine until no effect produces a new one
    async fn drive(&self, turn: &mut Turn, event: Event) -> Result<(), RouterError> {
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();
            let result = transition(&turn.record.state, &turn.context, current_event)?;

            tracing::debug!(
                session_id = %turn.context.session_id,
                event = event_name,
                from = turn.record.state.name(),
                to = result.new_state.name(),
                "Transition"
            );
            turn.record.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(turn, effect).await? {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    async fn execute_effect(
        &self,
        turn: &mut Turn,
        effect: Effect,
    ) -> Result<Option<Event>, RouterError> {
        match effect {
            Effect::PersistMessage { message } => {
                turn.record.conversation.push(message);
                Ok(None)
            }

            Effect::PersistState => {
                turn.record.touch();
                self.store.save(&turn.record).await?;
                Ok(None)
            }

            Effect::SetIntent { classification } => {
                turn.record.conversation.set_intent(classification);
                Ok(None)
            }

            Effect::RequestGreeting => {
                let mut request = turn.record.conversation.to_request(self.prompts.greet());
                if request.messages.is_empty() {
                    request.messages.push(LlmMessage::user(OPENING_TURN));
                }
                Ok(Some(self.call_llm(turn, &request).await))
            }

            Effect::ClassifyIntent => {
                turn.record.conversation.record_llm_call();
                let event = match self.classifier.classify(&turn.record.conversation).await {
                    Ok(classification) => {
                        tracing::info!(
                            session_id = %turn.context.session_id,
                            intent = %classification.intent,
                            topic = %classification.topic,
                            "Routing"
                        );
                        Event::IntentClassified { classification }
                    }
                    Err(e) => Event::TurnFailed {
                        message: e.to_string(),
                    },
                };
                Ok(Some(event))
            }

            Effect::RequestLlm { intent } => {
                let request = turn
                    .record
                    .conversation
                    .to_request(self.prompts.route(intent))
                    .with_tools(self.tools.tools_for(intent).definitions());
                Ok(Some(self.call_llm(turn, &request).await))
            }

            Effect::ExecuteTools { intent, calls } => {
                let event = match self.execute_tools(turn, intent, &calls).await {
                    Ok(results) => Event::ToolsComplete { results },
                    Err(e) => Event::TurnFailed {
                        message: e.to_string(),
                    },
                };
                Ok(Some(event))
            }

            Effect::Suspend => {
                tracing::debug!(session_id = %turn.context.session_id, "Awaiting input");
                Ok(None)
            }

            Effect::ReportFailure { message } => {
                tracing::warn!(session_id = %turn.context.session_id, error = %message, "Turn failed");
                turn.error = Some(message);
                Ok(None)
            }

            Effect::End => {
                tracing::info!(session_id = %turn.context.session_id, "Session ended");
                Ok(None)
            }
        }
    }

    /// One LLM call; failures become `TurnFailed`
    async fn call_llm(&self, turn: &mut Turn, request: &LlmRequest) -> Event {
        turn.record.conversation.record_llm_call();
        match self.llm.complete(request).await {
            Ok(response) => Event::LlmResponse {
                content: response.content,
            },
            Err(e) => Event::TurnFailed {
                message: e.to_string(),
            },
        }
    }

    /// Run the batch sequentially in request order. Every name is resolved
    /// before the first call runs; a failing call yields the failure sentinel
    /// and the batch continues.
    async fn execute_tools(
        &self,
        turn: &Turn,
        intent: Intent,
        calls: &[ToolCall],
    ) -> Result<Vec<ToolResult>, RouterError> {
        let tool_set = self.tools.tools_for(intent);
        let resolved: Vec<(&ToolCall, Arc<dyn Tool>)> = calls
            .iter()
            .map(|call| {
                tool_set
                    .get(&call.name)
                    .map(|tool| (call, tool))
                    .ok_or_else(|| RouterError::UnknownTool {
                        intent,
                        name: call.name.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;

        let mut results = Vec::with_capacity(resolved.len());
        for (call, tool) in resolved {
            let start = std::time::Instant::now();
            let result = match tool.run(call.input.clone()).await {
                Ok(value) => {
                    tracing::info!(
                        session_id = %turn.context.session_id,
                        tool = %call.name,
                        duration_ms = %start.elapsed().as_millis(),
                        "Tool completed"
                    );
                    ToolResult::success(call.id.clone(), value)
                }
                Err(e) => {
                    tracing::error!(
                        session_id = %turn.context.session_id,
                        tool = %call.name,
                        duration_ms = %start.elapsed().as_millis(),
                        error = %e,
                        "Tool failed"
                    );
                    ToolResult::failure(call.id.clone())
                }
            };
            results.push(result);
        }

        Ok(results)
    }
}
