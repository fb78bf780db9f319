//! Delivery of accepted events to the Argo events webhook
//!
//! [`EventForwarder`] is the seam between the gateway loop and the HTTP
//! transport. The production implementation is [`http::HttpForwarder`];
//! [`mock::RecordingForwarder`] records calls for tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SinkConfig;
use crate::event::Event;

pub mod http;
pub mod mock;

pub use http::HttpForwarder;
pub use mock::RecordingForwarder;

/// Literal `Content-Type` the Argo gerrit event source expects
pub const CONTENT_TYPE_VALUE: &str = "json";

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Endpoint answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ForwardError {
    /// HTTP status of the failed attempt, if the endpoint answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ForwardError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// An accepted event, ready to be forwarded unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPayload {
    event: Event,
}

impl ForwardPayload {
    pub fn new(event: Event) -> Self {
        Self { event }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Request body: the original stream line
    pub fn body(&self) -> &str {
        self.event.raw()
    }

    pub fn into_event(self) -> Event {
        self.event
    }
}

/// One outbound call: payload plus the routing values from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRequest {
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl ForwardRequest {
    pub fn new(payload: &ForwardPayload, url: &str, authorization: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            authorization: authorization.map(String::from),
            body: payload.body().to_string(),
        }
    }

    pub fn for_sink(payload: &ForwardPayload, sink: &SinkConfig) -> Self {
        Self::new(payload, &sink.endpoint_url(), sink.token.as_deref())
    }
}

/// Successful delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub status: u16,
}

#[async_trait]
pub trait EventForwarder: Send + Sync {
    /// Deliver one accepted event. Any non-2xx answer is an error.
    async fn forward(&self, payload: &ForwardPayload) -> Result<ForwardOutcome, ForwardError>;
}

/// Emit the per-attempt record: type, project, change and resulting status.
pub(crate) fn log_attempt(event: &Event, status: Option<u16>) {
    let event_type = event.event_type().unwrap_or("-");
    let project = event.project().unwrap_or("-");
    let change_id = event.change_id().unwrap_or("-");

    match status {
        Some(status) => tracing::info!(
            event_type,
            project,
            change_id,
            status,
            "{}\t{}\t{} -> {}",
            event_type,
            project,
            change_id,
            status
        ),
        None => tracing::warn!(
            event_type,
            project,
            change_id,
            status = "error",
            "{}\t{}\t{} -> error",
            event_type,
            project,
            change_id
        ),
    }
}
