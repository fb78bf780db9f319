//! Remote command sessions
//!
//! The gateway needs very little from the secure-shell side: a connected
//! session able to start one process, a line stream of that process' output
//! and two teardown calls. Both teardown calls are synchronous and must not
//! block, since they run from the shutdown path.

pub mod error;
pub mod handle;
pub mod mock;
pub mod ssh;

pub use error::SessionError;
pub use handle::SessionHandle;
pub use mock::{MockConnector, MockSessionState};
pub use ssh::SshConnector;

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

pub type LineStreamItem = Result<String, SessionError>;
pub type LineStream = Pin<Box<dyn Stream<Item = LineStreamItem> + Send>>;

/// Program and arguments run on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RemoteCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `gerrit stream-events`, with one `-s` per subscribed event type
    pub fn stream_events(subscriptions: &[String]) -> Self {
        subscriptions
            .iter()
            .fold(Self::new("gerrit").arg("stream-events"), |cmd, s| {
                cmd.arg("-s").arg(s.as_str())
            })
    }

    /// Shell-quoted single line, as the remote login shell receives it
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(self.args.iter()))
    }
}

/// A process started inside a [`RemoteSession`].
pub trait RemoteProcess: Send + Sync {
    /// Ask the process to stop. Never blocks.
    fn terminate(&self) -> Result<(), SessionError>;
}

/// A started process together with its standard output, split into lines.
pub struct ProcessChannel {
    pub process: Arc<dyn RemoteProcess>,
    pub stdout: LineStream,
}

#[async_trait]
pub trait RemoteSession: Send + Sync {
    async fn open_process(&self, command: &RemoteCommand) -> Result<ProcessChannel, SessionError>;

    /// Drop the connection. Never blocks.
    fn close(&self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn RemoteSession>, SessionError>;
}
