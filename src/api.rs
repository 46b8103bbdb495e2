//! HTTP session boundary
//!
//! Start a session, feed it turns, read it back. Every turn runs to the next
//! suspension point before the response is sent.

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::runtime::ConversationRouter;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ConversationRouter>,
}

impl AppState {
    pub fn new(router: ConversationRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}
