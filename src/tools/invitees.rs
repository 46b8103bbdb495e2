//! Invitee listing for one scheduled event

use super::args::decode_scalar;
use super::{Tool, ToolError};
use crate::calendly::SchedulingService;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ListEventInviteesTool {
    client: Arc<dyn SchedulingService>,
}

impl ListEventInviteesTool {
    pub fn new(client: Arc<dyn SchedulingService>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListEventInviteesTool {
    fn name(&self) -> &'static str {
        "list_calendly_event_invitees"
    }

    fn description(&self) -> String {
        "List invitees for a specific Calendly scheduled event. Input must be the event URI string."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["event_uri"],
            "properties": {
                "event_uri": {"type": "string", "description": "Scheduled event URI"}
            }
        })
    }

    async fn run(&self, input: Value) -> Result<Value, ToolError> {
        let event_uri = decode_scalar(&input, &["event_uri", "uri", "event"]).ok_or_else(|| {
            ToolError::Validation("Missing required fields: 'event_uri' is required.".to_string())
        })?;
        Ok(self.client.list_event_invitees(&event_uri).await?)
    }
}
