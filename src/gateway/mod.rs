//! Gateway orchestration
//!
//! Pulls events from the [`StreamReader`], classifies them and forwards the
//! accepted ones, strictly one at a time and in arrival order. A forwarding
//! failure ends the loop; the host is expected to restart the process.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::event::{Classifier, Verdict};
use crate::forwarder::{EventForwarder, HttpForwarder};
use crate::session::{RemoteCommand, SessionConnector, SshConnector};
use crate::stream::{StopHandle, StreamControl, StreamReader, StreamState};


/// Counters of one completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub received: u64,
    pub forwarded: u64,
    pub rejected: u64,
}

pub struct Gateway {
    reader: StreamReader,
    classifier: Classifier,
    forwarder: Arc<dyn EventForwarder>,
    control: Arc<StreamControl>,
    dispatch_interval: Duration,
}

impl Gateway {
    /// Wire a gateway from its collaborators.
    ///
    /// Fails only on configuration problems, e.g. an invalid recheck pattern.
    pub fn new(
        config: &GatewayConfig,
        connector: Arc<dyn SessionConnector>,
        forwarder: Arc<dyn EventForwarder>,
    ) -> Result<Self> {
        let classifier = Classifier::from_config(&config.recheck)?;
        let control = Arc::new(StreamControl::new());
        let command = RemoteCommand::stream_events(&config.subscriptions);

        Ok(Self {
            reader: StreamReader::new(connector, command, Arc::clone(&control)),
            classifier,
            forwarder,
            control,
            dispatch_interval: config.dispatch_interval,
        })
    }

    /// Production wiring: ssh client in, HTTP out
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let connector = Arc::new(SshConnector::from_config(config));
        let forwarder = Arc::new(HttpForwarder::from_sink(&config.sink)?);
        Self::new(config, connector, forwarder)
    }

    /// Handle for stopping the gateway from another task
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(Arc::clone(&self.control))
    }

    /// Stop listening and release the remote session. Idempotent; never
    /// blocks and never fails.
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn state(&self) -> StreamState {
        self.control.state()
    }

    /// Run until the remote side closes the stream or [`Gateway::stop`] is
    /// called.
    ///
    /// Decode and forwarding errors end the run and are returned as is.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut events = self.reader.open().await?;
        let mut summary = RunSummary::default();

        while let Some(event) = events.next_event().await? {
            summary.received += 1;

            match self.classifier.classify(event) {
                Verdict::Accept(payload) => {
                    self.forwarder.forward(&payload).await?;
                    summary.forwarded += 1;
                }
                Verdict::Reject { reason, event } => {
                    summary.rejected += 1;
                    debug!(
                        "Rejecting {} event for {}: {}",
                        event.event_type().unwrap_or("untyped"),
                        event.change_id().unwrap_or("unknown change"),
                        reason
                    );
                }
            }

            if !self.dispatch_interval.is_zero() {
                tokio::time::sleep(self.dispatch_interval).await;
            }
        }

        info!(
            "Event stream ended: {} received, {} forwarded, {} rejected",
            summary.received, summary.forwarded, summary.rejected
        );
        Ok(summary)
    }
}
