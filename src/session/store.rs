//! Session persistence keyed by session id

use super::ConversationState;
use crate::state_machine::RouterState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt session record {id}: {source}")]
    Corrupt {
        id: String,
        source: serde_json::Error,
    },
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Session store lock poisoned")]
    Poisoned,
    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Everything needed to resume a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub state: RouterState,
    pub conversation: ConversationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(id: impl Into<String>, state: RouterState) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state,
            conversation: ConversationState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Keyed session storage. Implementations must allow concurrent access to
/// distinct keys.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Insert or replace the record under `record.id`
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        (**self).load(id).await
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        (**self).save(record).await
    }
}

/// Process-lifetime store
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }
}
