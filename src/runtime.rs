//! Runtime for executing conversations
//!
//! The router owns the effect loop: it feeds events through the pure
//! transition function, executes the resulting effects (LLM calls, tool
//! batches, persistence) and stops at the first suspension point. Each call
//! rehydrates the session from the store by key.

mod router;

#[cfg(test)]
pub mod testing;

pub use router::{
    ConversationRouter, RouterBuilder, RouterError, TurnInput, TurnOutcome, TurnStatus,
};
