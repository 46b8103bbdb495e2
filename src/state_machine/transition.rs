//! Pure state transition function

use super::{Effect, Event, RouterContext, RouterState};
use crate::classifier::Intent;
use crate::session::Message;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: RouterState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: RouterState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Agent is busy, cannot accept input until the current route finishes")]
    AgentBusy,
    #[error("Session has ended")]
    SessionEnded,
    #[error("No user input supplied")]
    EmptyInput,
    #[error("Tool results do not match the pending calls: expected {expected:?}, got {actual:?}")]
    ResultMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// Given the same inputs it always produces the same outputs and performs no
/// I/O. Message appends are expressed as `PersistMessage` effects so that the
/// conversation only ever grows.
pub fn transition(
    state: &RouterState,
    context: &RouterContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Session start
        // ============================================================
        (RouterState::New, Event::SessionOpened) if context.greet => {
            Ok(TransitionResult::new(RouterState::Greeting)
                .with_effect(Effect::PersistState)
                .with_effect(Effect::RequestGreeting))
        }

        (RouterState::New, Event::SessionOpened) => {
            Ok(suspend(TransitionResult::new(RouterState::AwaitingInput)))
        }

        (RouterState::Greeting, Event::LlmResponse { content }) => Ok(suspend(
            TransitionResult::new(RouterState::AwaitingInput)
                .with_effect(Effect::persist_assistant_message(content)),
        )),

        // ============================================================
        // User input
        // ============================================================
        (RouterState::AwaitingInput | RouterState::New, Event::UserInput { texts }) => {
            let texts: Vec<String> = texts
                .into_iter()
                .filter(|text| !text.trim().is_empty())
                .collect();
            if texts.is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            Ok(TransitionResult::new(RouterState::Classifying)
                .with_effects(texts.into_iter().map(Effect::persist_user_message))
                .with_effect(Effect::PersistState)
                .with_effect(Effect::ClassifyIntent))
        }

        (RouterState::Ended, Event::UserInput { .. }) => Err(TransitionError::SessionEnded),

        (s, Event::UserInput { .. }) if s.is_busy() => Err(TransitionError::AgentBusy),

        // ============================================================
        // Classification: exactly one route per result
        // ============================================================
        (RouterState::Classifying, Event::IntentClassified { classification }) => {
            let intent = classification.intent;
            Ok(TransitionResult::new(RouterState::Routing { intent })
                .with_effect(Effect::SetIntent { classification })
                .with_effect(Effect::PersistState)
                .with_effect(Effect::RequestLlm { intent }))
        }

        // ============================================================
        // Route step: continue iff the new message requests tools
        // ============================================================
        (RouterState::Routing { intent: Intent::Leave }, Event::LlmResponse { content }) => {
            Ok(TransitionResult::new(RouterState::Ended)
                .with_effect(Effect::persist_assistant_message(content))
                .with_effect(Effect::PersistState)
                .with_effect(Effect::End))
        }

        (RouterState::Routing { intent }, Event::LlmResponse { content }) => {
            let intent = *intent;
            let message = Message::assistant(content);
            let calls = message.tool_calls();

            if calls.is_empty() {
                return Ok(suspend(
                    TransitionResult::new(RouterState::AwaitingInput)
                        .with_effect(Effect::PersistMessage { message }),
                ));
            }

            Ok(TransitionResult::new(RouterState::ToolExecuting {
                intent,
                pending: calls.clone(),
            })
            .with_effect(Effect::PersistMessage { message })
            .with_effect(Effect::PersistState)
            .with_effect(Effect::ExecuteTools { intent, calls }))
        }

        // ============================================================
        // Tool batch complete: back to the same route
        // ============================================================
        (RouterState::ToolExecuting { intent, pending }, Event::ToolsComplete { results }) => {
            let expected: Vec<String> = pending.iter().map(|c| c.id.clone()).collect();
            let actual: Vec<String> = results.iter().map(|r| r.tool_use_id.clone()).collect();
            if expected != actual {
                return Err(TransitionError::ResultMismatch { expected, actual });
            }

            Ok(TransitionResult::new(RouterState::Routing { intent: *intent })
                .with_effects(results.iter().map(Effect::persist_tool_result))
                .with_effect(Effect::PersistState)
                .with_effect(Effect::RequestLlm { intent: *intent }))
        }

        // ============================================================
        // Turn failure: suspend without rolling anything back. An abandoned
        // batch still gets one failure result per call.
        // ============================================================
        (RouterState::ToolExecuting { pending, .. }, Event::TurnFailed { message }) => {
            Ok(suspend(
                TransitionResult::new(RouterState::AwaitingInput)
                    .with_effects(Effect::abandon_tool_calls(pending))
                    .with_effect(Effect::ReportFailure { message }),
            ))
        }

        (s, Event::TurnFailed { message }) if s.is_busy() => Ok(suspend(
            TransitionResult::new(RouterState::AwaitingInput)
                .with_effect(Effect::ReportFailure { message }),
        )),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} in state {}",
            event.name(),
            state.name()
        ))),
    }
}

fn suspend(result: TransitionResult) -> TransitionResult {
    result
        .with_effect(Effect::PersistState)
        .with_effect(Effect::Suspend)
}
