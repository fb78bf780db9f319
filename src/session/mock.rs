use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

use super::{
    LineStream, ProcessChannel, RemoteCommand, RemoteProcess, RemoteSession, SessionConnector,
    SessionError,
};

/// Shared bookkeeping of a [`MockConnector`], inspectable from tests.
#[derive(Default)]
pub struct MockSessionState {
    connects: AtomicUsize,
    terminates: AtomicUsize,
    closes: AtomicUsize,
    commands: Mutex<Vec<RemoteCommand>>,
    released: Notify,
    feeder: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl MockSessionState {
    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn terminate_calls(&self) -> usize {
        self.terminates.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Commands the session was asked to run
    pub fn commands(&self) -> Vec<RemoteCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Emit one more output line on a held-open stream.
    ///
    /// Returns `false` once the stream has gone away.
    pub fn push_line(&self, line: impl Into<String>) -> bool {
        match self.feeder.lock().unwrap().as_ref() {
            Some(sender) => sender.send(line.into()).is_ok(),
            None => false,
        }
    }

    /// End a held-open stream as if the remote side closed it
    pub fn finish(&self) {
        self.feeder.lock().unwrap().take();
    }
}

/// Scripted stand-in for the ssh connection.
///
/// The process prints the scripted lines and then either closes its output
/// or, with [`MockConnector::hold_open`], waits like a quiet Gerrit until it
/// is terminated, closed or [`MockSessionState::finish`]ed.
#[derive(Clone)]
pub struct MockConnector {
    script: Vec<String>,
    hold_open: bool,
    fail_connect: bool,
    fail_teardown: bool,
    state: Arc<MockSessionState>,
}

impl MockConnector {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: lines.into_iter().map(Into::into).collect(),
            hold_open: false,
            fail_connect: false,
            fail_teardown: false,
            state: Arc::new(MockSessionState::default()),
        }
    }

    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// terminate() and close() report errors (they are still counted)
    pub fn failing_teardown(mut self) -> Self {
        self.fail_teardown = true;
        self
    }

    pub fn state(&self) -> Arc<MockSessionState> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl SessionConnector for MockConnector {
    async fn connect(&self) -> Result<Arc<dyn RemoteSession>, SessionError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(SessionError::Connect("connection refused".to_string()));
        }
        Ok(Arc::new(MockSession {
            connector: self.clone(),
        }))
    }
}

struct MockSession {
    connector: MockConnector,
}

#[async_trait]
impl RemoteSession for MockSession {
    async fn open_process(&self, command: &RemoteCommand) -> Result<ProcessChannel, SessionError> {
        let state = &self.connector.state;
        state.commands.lock().unwrap().push(command.clone());

        let (sender, receiver) = mpsc::unbounded_channel();
        for line in &self.connector.script {
            let _ = sender.send(line.clone());
        }
        if self.connector.hold_open {
            *state.feeder.lock().unwrap() = Some(sender);
        }

        Ok(ProcessChannel {
            process: Arc::new(MockProcess {
                state: Arc::clone(state),
                fail: self.connector.fail_teardown,
            }),
            stdout: line_stream(receiver, Arc::clone(state)),
        })
    }

    fn close(&self) -> Result<(), SessionError> {
        let state = &self.connector.state;
        state.closes.fetch_add(1, Ordering::SeqCst);
        state.finish();
        state.released.notify_one();
        if self.connector.fail_teardown {
            return Err(SessionError::Close("connection already lost".to_string()));
        }
        Ok(())
    }
}

struct MockProcess {
    state: Arc<MockSessionState>,
    fail: bool,
}

impl RemoteProcess for MockProcess {
    fn terminate(&self) -> Result<(), SessionError> {
        self.state.terminates.fetch_add(1, Ordering::SeqCst);
        self.state.released.notify_one();
        if self.fail {
            return Err(SessionError::Terminate("no such process".to_string()));
        }
        Ok(())
    }
}

fn line_stream(
    receiver: mpsc::UnboundedReceiver<String>,
    state: Arc<MockSessionState>,
) -> LineStream {
    Box::pin(futures::stream::unfold(
        (receiver, state),
        |(mut receiver, state)| async move {
            tokio::select! {
                biased;
                _ = state.released.notified() => None,
                line = receiver.recv() => line.map(|line| (Ok(line), (receiver, state))),
            }
        },
    ))
}
