//! reqwest-backed forwarder

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use super::{
    log_attempt, EventForwarder, ForwardError, ForwardOutcome, ForwardPayload, ForwardRequest,
    CONTENT_TYPE_VALUE,
};
use crate::config::SinkConfig;

/// Posts events to the Argo webhook, one request at a time.
///
/// The client is reused between calls; the gateway never has two requests
/// in flight, so pooling only saves the reconnect.
pub struct HttpForwarder {
    client: Client,
    url: String,
    authorization: Option<String>,
}

impl HttpForwarder {
    pub fn new(url: impl Into<String>, authorization: Option<String>) -> Result<Self, ForwardError> {
        let client = Client::builder().build().map_err(ForwardError::Client)?;

        Ok(Self {
            client,
            url: url.into(),
            authorization,
        })
    }

    pub fn from_sink(sink: &SinkConfig) -> Result<Self, ForwardError> {
        Self::new(sink.endpoint_url(), sink.token.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue a single POST and map the answer
    pub async fn send(&self, request: &ForwardRequest) -> Result<ForwardOutcome, ForwardError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, CONTENT_TYPE_VALUE)
            .body(request.body.clone());
        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let response = builder.send().await.map_err(ForwardError::Transport)?;
        let status = response.status();

        if status.is_success() {
            return Ok(ForwardOutcome {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Endpoint {} answered {}: {}", request.url, status, body);
        Err(ForwardError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl EventForwarder for HttpForwarder {
    async fn forward(&self, payload: &ForwardPayload) -> Result<ForwardOutcome, ForwardError> {
        let request = ForwardRequest::new(payload, &self.url, self.authorization.as_deref());
        let result = self.send(&request).await;

        let status = match &result {
            Ok(outcome) => Some(outcome.status),
            Err(err) => err.status(),
        };
        log_attempt(payload.event(), status);

        result
    }
}
