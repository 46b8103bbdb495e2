//! Acme Dental scheduling assistant
//!
//! Classifies each user turn into an intent, routes it to an intent-specific
//! LLM + tool loop bound to the Calendly API, and suspends between turns with
//! the session persisted by key.

pub mod api;
pub mod calendly;
pub mod classifier;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod runtime;
pub mod session;
pub mod state_machine;
pub mod tools;

use calendly::{CalendlyClient, SchedulingService};
use config::{AppConfig, StoreLocation};
use llm::{AnthropicService, LlmService, LoggingService};
use prompts::Prompts;
use runtime::ConversationRouter;
use session::{MemoryStore, SessionStore, SqliteStore};
use std::sync::Arc;
use tools::IntentToolTable;

/// Wire the production collaborators described by `config` into a router
pub fn build_router(config: &AppConfig) -> Result<ConversationRouter, Box<dyn std::error::Error>> {
    let anthropic = AnthropicService::new(
        config.anthropic_api_key.clone(),
        config.model.clone(),
        config.llm_gateway.as_deref(),
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(anthropic)));

    let client: Arc<dyn SchedulingService> = Arc::new(CalendlyClient::new(
        config.calendly_api_token.clone(),
        config.calendly_base_url.as_deref(),
    )?);

    let store: Arc<dyn SessionStore> = match &config.store {
        StoreLocation::Memory => Arc::new(MemoryStore::new()),
        StoreLocation::Sqlite(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %path.display(), "Opening session database");
            Arc::new(SqliteStore::open(path)?)
        }
    };

    let prompts = Prompts::load(config.prompts_dir.as_deref())?;

    tracing::info!(model = %config.model, greet = config.greet, "Router configured");
    Ok(ConversationRouter::builder(llm, store)
        .tools(IntentToolTable::standard(&client))
        .prompts(prompts)
        .greet(config.greet)
        .build())
}
