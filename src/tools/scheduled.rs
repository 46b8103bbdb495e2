//! Scheduled event listing

use super::args::{decode_object, opt_str};
use super::{Tool, ToolError};
use crate::calendly::SchedulingService;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const PAGE_SIZE: u32 = 20;
const ACTIVE: &str = "active";

/// Lists active scheduled events, one page
pub struct ListScheduledEventsTool {
    client: Arc<dyn SchedulingService>,
}

impl ListScheduledEventsTool {
    pub fn new(client: Arc<dyn SchedulingService>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListScheduledEventsTool {
    fn name(&self) -> &'static str {
        "list_calendly_scheduled_events"
    }

    fn description(&self) -> String {
        "List Calendly scheduled events. Event specifics should only be shared with their invitees. \
Invitees can be obtained using a separate tool. Input is a JSON object with keys:\n\
- 'user': user URI\n\
- 'organization': organization URI"
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user": {"type": "string", "description": "User URI"},
                "organization": {"type": "string", "description": "Organization URI"}
            }
        })
    }

    async fn run(&self, input: Value) -> Result<Value, ToolError> {
        let args = decode_object(input);
        Ok(self
            .client
            .list_scheduled_events(
                opt_str(&args, "user"),
                opt_str(&args, "organization"),
                PAGE_SIZE,
                Some(ACTIVE),
            )
            .await?)
    }
}
