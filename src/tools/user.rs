//! Current scheduling user lookup

use super::{Tool, ToolError};
use crate::calendly::SchedulingService;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct GetCurrentUserTool {
    client: Arc<dyn SchedulingService>,
}

impl GetCurrentUserTool {
    pub fn new(client: Arc<dyn SchedulingService>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetCurrentUserTool {
    fn name(&self) -> &'static str {
        "get_calendly_current_user"
    }

    fn description(&self) -> String {
        "Get the current Calendly user profile, including their URI which is often needed to filter other Calendly queries.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn run(&self, _input: Value) -> Result<Value, ToolError> {
        Ok(self.client.get_current_user().await?)
    }
}
