//! Event stream over one remote session
//!
//! [`StreamReader::open`] connects, starts the stream-events command and
//! hands out an [`EventStream`]. The stream is lazy and not restartable; it
//! ends at end of output or once stop has been requested, and releases the
//! session on the way out whatever the reason.

use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use super::control::StreamControl;
use crate::error::{GatewayError, Result};
use crate::event::Event;
use crate::session::{LineStream, RemoteCommand, SessionConnector, SessionHandle};

pub struct StreamReader {
    connector: Arc<dyn SessionConnector>,
    command: RemoteCommand,
    control: Arc<StreamControl>,
}

impl StreamReader {
    pub fn new(
        connector: Arc<dyn SessionConnector>,
        command: RemoteCommand,
        control: Arc<StreamControl>,
    ) -> Self {
        Self {
            connector,
            command,
            control,
        }
    }

    pub fn command(&self) -> &RemoteCommand {
        &self.command
    }

    /// Open the session and the remote process.
    ///
    /// Returns an already finished stream when stop was requested first.
    /// Only the first call gets that far, even if it failed; later calls
    /// return [`GatewayError::AlreadyStarted`].
    pub async fn open(&self) -> Result<EventStream> {
        if !self.control.begin() {
            return Err(GatewayError::AlreadyStarted);
        }
        if self.control.is_stopped() {
            debug!("Stop requested before the session was opened");
            return Ok(EventStream::finished(Arc::clone(&self.control)));
        }

        let session = self.connector.connect().await?;
        if self.control.is_stopped() {
            if let Err(e) = session.close() {
                debug!("Ignoring failure to close remote session: {}", e);
            }
            return Ok(EventStream::finished(Arc::clone(&self.control)));
        }

        let channel = match session.open_process(&self.command).await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = session.close() {
                    debug!("Ignoring failure to close remote session: {}", close_err);
                }
                return Err(e.into());
            }
        };

        let handle = Arc::new(SessionHandle::new(session, channel.process));
        if let Err(handle) = self.control.activate(Arc::clone(&handle)) {
            handle.release();
            return Err(GatewayError::AlreadyStarted);
        }

        info!("Streaming events with `{}`", self.command.command_line());
        Ok(EventStream {
            lines: Some(channel.stdout),
            handle: Some(handle),
            control: Arc::clone(&self.control),
        })
    }
}

/// Lazy sequence of decoded events from the remote process.
pub struct EventStream {
    lines: Option<LineStream>,
    handle: Option<Arc<SessionHandle>>,
    control: Arc<StreamControl>,
}

impl EventStream {
    fn finished(control: Arc<StreamControl>) -> Self {
        Self {
            lines: None,
            handle: None,
            control,
        }
    }

    /// Wait for the next event.
    ///
    /// `Ok(None)` once the remote side closed its output or stop was
    /// requested. A line that is not a JSON object ends the stream with an
    /// error. Blank lines are skipped.
    pub async fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            if self.control.is_stopped() {
                self.close();
                return Ok(None);
            }
            let Some(lines) = self.lines.as_mut() else {
                return Ok(None);
            };

            let item = lines.next().await;
            if self.control.is_stopped() {
                debug!("Stop requested, dropping what was read");
                self.close();
                return Ok(None);
            }

            match item {
                None => {
                    debug!("Remote process closed its output");
                    self.close();
                    return Ok(None);
                }
                Some(Err(e)) => {
                    self.close();
                    return Err(e.into());
                }
                Some(Ok(line)) if line.trim().is_empty() => continue,
                Some(Ok(line)) => match Event::from_line(line) {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => {
                        self.close();
                        return Err(e);
                    }
                },
            }
        }
    }

    /// The same sequence as a [`Stream`]; it ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Event>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut events = state?;
            match events.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(events))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    pub fn is_finished(&self) -> bool {
        self.lines.is_none()
    }

    fn close(&mut self) {
        self.lines = None;
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.close();
    }
}
