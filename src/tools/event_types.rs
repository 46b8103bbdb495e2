//! Event type listing

use super::args::{decode_object, opt_str};
use super::{Tool, ToolError};
use crate::calendly::SchedulingService;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ListEventTypesTool {
    client: Arc<dyn SchedulingService>,
}

impl ListEventTypesTool {
    pub fn new(client: Arc<dyn SchedulingService>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListEventTypesTool {
    fn name(&self) -> &'static str {
        "list_calendly_event_types"
    }

    fn description(&self) -> String {
        "List Calendly event types for a user or organization. Input is a JSON object with mandatory keys 'user' and 'organization' containing their URIs.".to_string()
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
            .list_event_types(opt_str(&args, "organization"), opt_str(&args, "user"))
            .await?)
    }
}
