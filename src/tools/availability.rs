//! Open slot lookup for one event type

use super::args::{decode_object, require, require_str};
use super::{Tool, ToolError};
use crate::calendly::{AvailabilityQuery, SchedulingService};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const KNOWN_KEYS: [&str; 4] = ["event_type", "start_time", "end_time", "timezone"];

pub struct ListAvailableTimesTool {
    client: Arc<dyn SchedulingService>,
}

impl ListAvailableTimesTool {
    pub fn new(client: Arc<dyn SchedulingService>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListAvailableTimesTool {
    fn name(&self) -> &'static str {
        "list_calendly_event_type_available_times"
    }

    fn description(&self) -> String {
        "List available time slots for a Calendly event type. Input is a JSON object with keys:\n\
- 'event_type' (required): the event type URI or UUID\n\
- 'start_time' (required): ISO8601 start time\n\
- 'end_time' (required): ISO8601 end time\n\
- any other supported query parameters will be passed through."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["event_type", "start_time", "end_time"],
            "properties": {
                "event_type": {"type": "string", "description": "Event type URI or UUID"},
                "start_time": {"type": "string", "description": "ISO8601 start time"},
                "end_time": {"type": "string", "description": "ISO8601 end time"}
            }
        })
    }

    async fn run(&self, input: Value) -> Result<Value, ToolError> {
        let mut args = decode_object(input);
        require(&args, &["event_type", "start_time", "end_time"])?;

        let query = AvailabilityQuery {
            event_type: require_str(&args, "event_type")?,
            start_time: require_str(&args, "start_time")?,
            end_time: require_str(&args, "end_time")?,
            // not forwarded; slots are returned in UTC
            timezone: None,
            extra: {
                args.retain(|k, _| !KNOWN_KEYS.contains(&k.as_str()));
                args
            },
        };

        Ok(self.client.list_event_type_available_times(&query).await?)
    }
}
