//! Remote scheduling service (Calendly v2 API)
//!
//! The remote record shapes are opaque to the assistant: every operation
//! hands back the JSON it received so tools can pass it straight to the model.

mod client;
mod error;

pub use client::CalendlyClient;
pub use error::CalendlyError;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Query for open slots of one event type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityQuery {
    /// Event type URI or bare UUID
    pub event_type: String,
    pub start_time: String,
    pub end_time: String,
    pub timezone: Option<String>,
    /// Additional query parameters, passed through untouched
    pub extra: Map<String, Value>,
}

/// A booking request for one invitee
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    /// Event type URI or bare UUID
    pub event_type: String,
    pub start_time: String,
    pub invitee: Value,
    pub location: Value,
}

/// Operations the assistant needs from the scheduling backend
#[async_trait]
pub trait SchedulingService: Send + Sync {
    async fn get_current_user(&self) -> Result<Value, CalendlyError>;

    async fn list_event_types(
        &self,
        organization: Option<&str>,
        user: Option<&str>,
    ) -> Result<Value, CalendlyError>;

    async fn list_scheduled_events(
        &self,
        user: Option<&str>,
        organization: Option<&str>,
        count: u32,
        status: Option<&str>,
    ) -> Result<Value, CalendlyError>;

    async fn list_event_invitees(&self, event_uri: &str) -> Result<Value, CalendlyError>;

    /// Mark an invitee as a no-show. Not offered to the model.
    async fn create_invitee_no_show(&self, invitee_uri: &str) -> Result<Value, CalendlyError>;

    async fn list_event_type_available_times(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<Value, CalendlyError>;

    async fn create_invitee(&self, booking: &Booking) -> Result<Value, CalendlyError>;

    async fn cancel_event(&self, event_uuid: &str) -> Result<Value, CalendlyError>;
}

#[async_trait]
impl<T: SchedulingService + ?Sized> SchedulingService for Arc<T> {
    async fn get_current_user(&self) -> Result<Value, CalendlyError> {
        (**self).get_current_user().await
    }

    async fn list_event_types(
        &self,
        organization: Option<&str>,
        user: Option<&str>,
    ) -> Result<Value, CalendlyError> {
        (**self).list_event_types(organization, user).await
    }

    async fn list_scheduled_events(
        &self,
        user: Option<&str>,
        organization: Option<&str>,
        count: u32,
        status: Option<&str>,
    ) -> Result<Value, CalendlyError> {
        (**self)
            .list_scheduled_events(user, organization, count, status)
            .await
    }

    async fn list_event_invitees(&self, event_uri: &str) -> Result<Value, CalendlyError> {
        (**self).list_event_invitees(event_uri).await
    }

    async fn create_invitee_no_show(&self, invitee_uri: &str) -> Result<Value, CalendlyError> {
        (**self).create_invitee_no_show(invitee_uri).await
    }

    async fn list_event_type_available_times(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<Value, CalendlyError> {
        (**self).list_event_type_available_times(query).await
    }

    async fn create_invitee(&self, booking: &Booking) -> Result<Value, CalendlyError> {
        (**self).create_invitee(booking).await
    }

    async fn cancel_event(&self, event_uuid: &str) -> Result<Value, CalendlyError> {
        (**self).cancel_event(event_uuid).await
    }
}
