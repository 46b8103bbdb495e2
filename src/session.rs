//! Per-session conversation state and its persistence
//!
//! A session is keyed by a stable identifier and survives any number of
//! suspend/resume cycles. Resuming rehydrates the record by key; nothing is
//! kept on a suspended stack frame.

mod conversation;
mod sqlite;
mod store;

pub use conversation::{ConversationState, Message, Role};
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, SessionRecord, SessionStore, StoreError};
