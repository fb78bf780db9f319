use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::{RemoteProcess, RemoteSession};

/// The single active session and its process.
///
/// Released exactly once, from whichever side gets there first: the
/// reader at end of stream or `stop()` from the shutdown path. Teardown
/// failures are logged and swallowed.
pub struct SessionHandle {
    session: Arc<dyn RemoteSession>,
    process: Arc<dyn RemoteProcess>,
    released: AtomicBool,
}

impl SessionHandle {
    pub fn new(session: Arc<dyn RemoteSession>, process: Arc<dyn RemoteProcess>) -> Self {
        Self {
            session,
            process,
            released: AtomicBool::new(false),
        }
    }

    /// Terminate the process, then close the session.
    ///
    /// Returns `false` when an earlier call already did the work.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }

        if let Err(e) = self.process.terminate() {
            debug!("Ignoring failure to terminate remote process: {}", e);
        }
        if let Err(e) = self.session.close() {
            debug!("Ignoring failure to close remote session: {}", e);
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::MockConnector;
    use crate::session::{RemoteCommand, SessionConnector};

    async fn open(connector: &MockConnector) -> SessionHandle {
        let session = connector.connect().await.unwrap();
        let channel = session
            .open_process(&RemoteCommand::stream_events(&[]))
            .await
            .unwrap();
        SessionHandle::new(session, channel.process)
    }

    #[tokio::test]
    async fn test_release_runs_once() {
        let connector = MockConnector::new(Vec::<String>::new());
        let handle = open(&connector).await;

        assert!(!handle.is_released());
        assert!(handle.release());
        assert!(!handle.release());
        assert!(handle.is_released());

        let state = connector.state();
        assert_eq!(state.terminate_calls(), 1);
        assert_eq!(state.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_release_closes_session_when_terminate_fails() {
        let connector = MockConnector::new(Vec::<String>::new()).failing_teardown();
        let handle = open(&connector).await;

        assert!(handle.release());

        let state = connector.state();
        assert_eq!(state.terminate_calls(), 1);
        assert_eq!(state.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_release() {
        let connector = MockConnector::new(Vec::<String>::new());
        let handle = Arc::new(open(&connector).await);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handle = Arc::clone(&handle);
                tokio::spawn(async move { handle.release() })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(connector.state().terminate_calls(), 1);
        assert_eq!(connector.state().close_calls(), 1);
    }
}
