//! SQLite-backed session store

use super::{ConversationState, SessionRecord, SessionStore, StoreError};
use crate::state_machine::RouterState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQL schema for initialization
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    conversation TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_updated ON sessions(updated_at DESC);
";

/// Thread-safe database handle
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn load_blocking(conn: &Connection, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row = conn
            .query_row(
                "SELECT id, state, conversation, created_at, updated_at FROM sessions WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, state, conversation, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let corrupt = |source| StoreError::Corrupt {
            id: id.clone(),
            source,
        };
        let state: RouterState = serde_json::from_str(&state).map_err(corrupt)?;
        let conversation: ConversationState =
            serde_json::from_str(&conversation).map_err(corrupt)?;

        Ok(Some(SessionRecord {
            id: id.clone(),
            state,
            conversation,
            created_at: parse_datetime(&created_at),
            updated_at: parse_datetime(&updated_at),
        }))
    }

    fn save_blocking(conn: &Connection, record: &SessionRecord) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO sessions (id, state, conversation, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                state = excluded.state,
                conversation = excluded.conversation,
                updated_at = excluded.updated_at",
            params![
                record.id,
                serde_json::to_string(&record.state)?,
                serde_json::to_string(&record.conversation)?,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let conn = self.conn.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            Self::load_blocking(&conn, &id)
        })
        .await?
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            Self::save_blocking(&conn, &record)
        })
        .await?
    }
}
