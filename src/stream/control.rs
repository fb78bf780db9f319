use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::session::SessionHandle;

/// Lifecycle of the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No session yet
    Open,
    Streaming,
    /// Stop requested, teardown pending
    Closing,
    /// Session and process released
    Closed,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamState::Open => "open",
            StreamState::Streaming => "streaming",
            StreamState::Closing => "closing",
            StreamState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Stop flag plus the one active session, shared between the reading task
/// and whoever calls `stop()`.
///
/// Only atomics and a write-once slot: `stop()` never waits on the reader.
#[derive(Debug, Default)]
pub struct StreamControl {
    stop: AtomicBool,
    started: AtomicBool,
    handle: OnceLock<Arc<SessionHandle>>,
}

impl StreamControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stop flag and release the active session, if any.
    ///
    /// Idempotent, non-blocking, never fails.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.get() {
            handle.release();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Claim the single open of this stream. `false` when it was claimed
    /// before, whether or not that open succeeded.
    pub(crate) fn begin(&self) -> bool {
        !self.started.swap(true, Ordering::SeqCst)
    }

    /// Register the session of this stream. Fails if one was registered before.
    pub(crate) fn activate(&self, handle: Arc<SessionHandle>) -> Result<(), Arc<SessionHandle>> {
        self.handle.set(handle)?;
        // stop() may have run between the flag check and set()
        if self.is_stopped() {
            self.stop();
        }
        Ok(())
    }

    pub fn state(&self) -> StreamState {
        match self.handle.get() {
            Some(handle) if handle.is_released() => StreamState::Closed,
            Some(_) if self.is_stopped() => StreamState::Closing,
            Some(_) => StreamState::Streaming,
            None if self.is_stopped() => StreamState::Closed,
            None => StreamState::Open,
        }
    }
}

/// Cloneable handle for stopping a gateway from another task or a signal
/// listener.
#[derive(Debug, Clone)]
pub struct StopHandle {
    control: Arc<StreamControl>,
}

impl StopHandle {
    pub fn new(control: Arc<StreamControl>) -> Self {
        Self { control }
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }
}
