//! Scheduled event cancellation

use super::args::{decode_object, require_str};
use super::{Tool, ToolError};
use crate::calendly::SchedulingService;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct CancelEventTool {
    client: Arc<dyn SchedulingService>,
}

impl CancelEventTool {
    pub fn new(client: Arc<dyn SchedulingService>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CancelEventTool {
    fn name(&self) -> &'static str {
        "cancel_calendly_event"
    }

    fn description(&self) -> String {
        "Cancels (deletes) an invitee event. Input is a JSON object with keys:\n\
- 'event_uuid' (required): event UUID obtained from previously listed appointments for the invitee."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["event_uuid"],
            "properties": {
                "event_uuid": {"type": "string", "description": "Scheduled event UUID"}
            }
        })
    }

    async fn run(&self, input: Value) -> Result<Value, ToolError> {
        let args = decode_object(input);
        let event_uuid = require_str(&args, "event_uuid")?;
        Ok(self.client.cancel_event(&event_uuid).await?)
    }
}
