use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{log_attempt, EventForwarder, ForwardError, ForwardOutcome, ForwardPayload};

/// Forwarder double recording every payload it receives.
///
/// Answers come from a queue of status codes (200 once the queue is empty).
/// It also tracks how many calls overlapped, which must never exceed one.
#[derive(Clone, Default)]
pub struct RecordingForwarder {
    calls: Arc<Mutex<Vec<ForwardPayload>>>,
    statuses: Arc<Mutex<VecDeque<u16>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl RecordingForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the status code returned by the next unanswered call
    pub fn respond_with(self, status: u16) -> Self {
        self.statuses.lock().unwrap().push_back(status);
        self
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ForwardPayload> {
        self.calls.lock().unwrap().clone()
    }

    /// Bodies of all forwarded events, in call order
    pub fn bodies(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|payload| payload.body().to_string())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventForwarder for RecordingForwarder {
    async fn forward(&self, payload: &ForwardPayload) -> Result<ForwardOutcome, ForwardError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.calls.lock().unwrap().push(payload.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        log_attempt(payload.event(), Some(status));

        if (200..300).contains(&status) {
            Ok(ForwardOutcome { status })
        } else {
            Err(ForwardError::Status {
                status,
                body: String::new(),
            })
        }
    }
}
