//! HTTP client for the Calendly v2 API

use super::{AvailabilityQuery, Booking, CalendlyError, SchedulingService};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.calendly.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Bearer-token client for the scheduling service
pub struct CalendlyClient {
    client: Client,
    api_token: String,
    base_url: String,
}

impl CalendlyClient {
    pub fn new(api_token: String, base_url: Option<&str>) -> Result<Self, CalendlyError> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CalendlyError::Network {
                method: "INIT",
                url: base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_token,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bare UUIDs are expanded to a full event type URI
    fn event_type_uri(&self, event_type: &str) -> String {
        if event_type.contains('/') {
            event_type.to_string()
        } else {
            format!("{}/event_types/{event_type}", self.base_url)
        }
    }

    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value, CalendlyError> {
        self.send(Method::GET, path, params, None).await
    }

    async fn post(&self, path: &str, payload: Value) -> Result<Value, CalendlyError> {
        self.send(Method::POST, path, &[], Some(payload)).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        payload: Option<Value>,
    ) -> Result<Value, CalendlyError> {
        let url = format!("{}{path}", self.base_url);
        let method_name = if method == Method::POST { "POST" } else { "GET" };

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.api_token)
            .header("content-type", "application/json");
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(payload) = payload {
            request = request.json(&payload);
        }

        let started = std::time::Instant::now();
        let response = request.send().await.map_err(|e| CalendlyError::Network {
            method: method_name,
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| CalendlyError::Network {
            method: method_name,
            url: url.clone(),
            message: format!("failed to read response: {e}"),
        })?;

        tracing::debug!(
            method = method_name,
            path,
            status = status.as_u16(),
            duration_ms = %started.elapsed().as_millis(),
            "Calendly request"
        );

        if !status.is_success() {
            return Err(CalendlyError::Api {
                method: method_name,
                url,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| CalendlyError::Decode {
            method: method_name,
            url,
            message: e.to_string(),
        })
    }
}

/// The `collection` array of a list response, empty when absent
fn collection(mut data: Value) -> Value {
    data.get_mut("collection")
        .map_or_else(|| Value::Array(vec![]), Value::take)
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_opt(params: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        params.push((key.to_string(), v.to_string()));
    }
}

#[async_trait]
impl SchedulingService for CalendlyClient {
    async fn get_current_user(&self) -> Result<Value, CalendlyError> {
        let mut data = self.get("/users/me", &[]).await?;
        Ok(match data.get_mut("resource") {
            Some(resource) => resource.take(),
            None => data,
        })
    }

    async fn list_event_types(
        &self,
        organization: Option<&str>,
        user: Option<&str>,
    ) -> Result<Value, CalendlyError> {
        let mut params = Vec::new();
        push_opt(&mut params, "organization", organization);
        push_opt(&mut params, "user", user);
        self.get("/event_types", &params).await.map(collection)
    }

    async fn list_scheduled_events(
        &self,
        user: Option<&str>,
        organization: Option<&str>,
        count: u32,
        status: Option<&str>,
    ) -> Result<Value, CalendlyError> {
        let mut params = vec![("count".to_string(), count.to_string())];
        push_opt(&mut params, "user", user);
        push_opt(&mut params, "organization", organization);
        push_opt(&mut params, "status", status);
        self.get("/scheduled_events", &params).await.map(collection)
    }

    async fn list_event_invitees(&self, event_uri: &str) -> Result<Value, CalendlyError> {
        let uuid = event_uri.rsplit('/').next().unwrap_or(event_uri);
        let params = [("event".to_string(), event_uri.to_string())];
        self.get(&format!("/scheduled_events/{uuid}/invitees"), &params)
            .await
            .map(collection)
    }

    async fn create_invitee_no_show(&self, invitee_uri: &str) -> Result<Value, CalendlyError> {
        self.post("/invitee_no_shows", json!({ "invitee": invitee_uri }))
            .await
    }

    async fn list_event_type_available_times(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<Value, CalendlyError> {
        let mut params = vec![
            ("event_type".to_string(), self.event_type_uri(&query.event_type)),
            ("start_time".to_string(), query.start_time.clone()),
            ("end_time".to_string(), query.end_time.clone()),
        ];
        push_opt(&mut params, "timezone", query.timezone.as_deref());
        params.extend(
            query
                .extra
                .iter()
                .map(|(k, v)| (k.clone(), query_value(v))),
        );

        self.get("/event_type_available_times", &params)
            .await
            .map(collection)
    }

    async fn create_invitee(&self, booking: &Booking) -> Result<Value, CalendlyError> {
        let payload = json!({
            "event_type": self.event_type_uri(&booking.event_type),
            "start_time": booking.start_time,
            "invitee": booking.invitee,
            "location": booking.location,
        });
        self.post("/invitees", payload).await
    }

    async fn cancel_event(&self, event_uuid: &str) -> Result<Value, CalendlyError> {
        self.post(
            &format!("/scheduled_events/{event_uuid}/cancellation"),
            json!({}),
        )
        .await
    }
}
