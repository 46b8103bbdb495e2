//! Booking (invitee creation)

use super::args::{decode_object, require, require_str};
use super::{Tool, ToolError};
use crate::calendly::{Booking, SchedulingService};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct CreateInviteeTool {
    client: Arc<dyn SchedulingService>,
}

impl CreateInviteeTool {
    pub fn new(client: Arc<dyn SchedulingService>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateInviteeTool {
    fn name(&self) -> &'static str {
        "create_calendly_invitee"
    }

    fn description(&self) -> String {
        "Create (book) an invitee for a specific Calendly event type. event_type must be known \
and can be obtained using a tool given an appointment type by the user, or the default \
appointment type 'Dental Check Up' if none was given. Input is a JSON object with keys:\n\
- 'event_type' (required): event type URI or UUID\n\
- 'start_time' (required): ISO8601 datetime string in UTC\n\
- 'invitee' (required): object with invitee details, e.g. \
{ 'name': 'John Smith', 'email': 'test@example.com', 'timezone': 'America/New_York' }\n\
- 'location' (optional): object with location kind and location, e.g. \
{ 'kind': 'physical', 'location': 'Acme Dental Lane' }"
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["event_type", "start_time", "invitee"],
            "properties": {
                "event_type": {"type": "string"},
                "start_time": {"type": "string"},
                "invitee": {"type": "object"},
                "location": {"type": "object"}
            }
        })
    }

    async fn run(&self, input: Value) -> Result<Value, ToolError> {
        let mut args = decode_object(input);
        require(&args, &["event_type", "start_time", "invitee"])?;

        let booking = Booking {
            event_type: require_str(&args, "event_type")?,
            start_time: require_str(&args, "start_time")?,
            invitee: args.remove("invitee").unwrap_or_default(),
            location: args.remove("location").unwrap_or_default(),
        };

        Ok(self.client.create_invitee(&booking).await?)
    }
}
