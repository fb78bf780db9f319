//! Sessions through the system ssh client
//!
//! Each remote process is one `ssh -T user@host <command>` child. The child
//! is owned by the task reading its output; the teardown calls only send a
//! request over a channel, so they never block and never signal a process
//! that has already been reaped.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    LineStream, ProcessChannel, RemoteCommand, RemoteProcess, RemoteSession, SessionConnector,
    SessionError,
};
use crate::config::{split_ssh_command, GatewayConfig, RemoteTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    Terminate,
    Kill,
}

/// Opens sessions with an ssh client binary.
///
/// `program` is a shell-quoted command line, so extra client options can be
/// given in front of the generated ones (`ssh -o StrictHostKeyChecking=no`).
#[derive(Debug, Clone)]
pub struct SshConnector {
    target: RemoteTarget,
    private_key: Option<PathBuf>,
    program: String,
}

impl SshConnector {
    pub fn new(target: RemoteTarget, private_key: Option<PathBuf>, program: impl Into<String>) -> Self {
        Self {
            target,
            private_key,
            program: program.into(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.remote.clone(),
            config.private_key.clone(),
            config.ssh_program.clone(),
        )
    }

    /// Arguments passed to the ssh client in front of the remote command
    pub fn client_args(&self) -> Vec<String> {
        let mut args = vec![
            "-T".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-p".to_string(),
            self.target.port.to_string(),
        ];
        if let Some(key) = &self.private_key {
            args.push("-i".to_string());
            args.push(key.to_string_lossy().into_owned());
        }
        args.push(self.target.destination());
        args
    }
}

#[async_trait]
impl SessionConnector for SshConnector {
    async fn connect(&self) -> Result<Arc<dyn RemoteSession>, SessionError> {
        let mut client = split_ssh_command(&self.program)
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        let program = client.remove(0);

        debug!("Using {} to reach {}", self.program, self.target);
        Ok(Arc::new(SshSession {
            program,
            options: client,
            connector: self.clone(),
            teardown: OnceLock::new(),
        }))
    }
}

/// The ssh client process is the connection: closing the session kills it.
struct SshSession {
    program: String,
    options: Vec<String>,
    connector: SshConnector,
    teardown: OnceLock<mpsc::UnboundedSender<Teardown>>,
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn open_process(&self, command: &RemoteCommand) -> Result<ProcessChannel, SessionError> {
        if self.teardown.get().is_some() {
            return Err(SessionError::ProcessAlreadyOpen);
        }

        let program = &self.program;
        let mut cmd = Command::new(program);
        cmd.args(&self.options)
            .args(self.connector.client_args())
            .arg(command.command_line())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Spawning {} {:?}", program, command.command_line());
        let mut child = cmd.spawn().map_err(|source| SessionError::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or(SessionError::MissingStdout)?;
        if let Some(stderr) = child.stderr.take() {
            let origin = self.connector.target.destination();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("{}: {}", origin, line);
                }
            });
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        if self.teardown.set(sender.clone()).is_err() {
            return Err(SessionError::ProcessAlreadyOpen);
        }

        Ok(ProcessChannel {
            process: Arc::new(SshProcess { teardown: sender }),
            stdout: create_line_stream(ChildOutput {
                child,
                lines: BufReader::new(stdout).lines(),
                teardown: Some(receiver),
                stopping: false,
                done: false,
            }),
        })
    }

    fn close(&self) -> Result<(), SessionError> {
        if let Some(sender) = self.teardown.get() {
            // The reader is gone already when this fails; nothing left to kill.
            let _ = sender.send(Teardown::Kill);
        }
        Ok(())
    }
}

struct SshProcess {
    teardown: mpsc::UnboundedSender<Teardown>,
}

impl RemoteProcess for SshProcess {
    fn terminate(&self) -> Result<(), SessionError> {
        // The reader is gone already when this fails; the client went with it.
        let _ = self.teardown.send(Teardown::Terminate);
        Ok(())
    }
}

struct ChildOutput {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    teardown: Option<mpsc::UnboundedReceiver<Teardown>>,
    stopping: bool,
    done: bool,
}

impl ChildOutput {
    fn apply(&mut self, request: Teardown) {
        self.stopping = true;
        match request {
            Teardown::Terminate => send_terminate(&mut self.child),
            Teardown::Kill => {
                if let Err(e) = self.child.start_kill() {
                    debug!("Failed to kill ssh client: {}", e);
                }
            }
        }
    }

    async fn next_line(&mut self) -> Option<Result<String, SessionError>> {
        if self.done {
            return None;
        }

        loop {
            tokio::select! {
                request = recv_teardown(&mut self.teardown) => match request {
                    Some(Teardown::Kill) => {
                        // The connection is gone; whatever is still buffered is dropped.
                        self.apply(Teardown::Kill);
                        self.done = true;
                        return None;
                    }
                    Some(request) => self.apply(request),
                    None => self.teardown = None,
                },
                line = self.lines.next_line() => {
                    return match line {
                        Ok(Some(line)) => Some(Ok(line)),
                        Ok(None) => self.finish().await,
                        Err(e) if self.stopping => {
                            debug!("Read error while stopping: {}", e);
                            self.done = true;
                            None
                        }
                        Err(e) => {
                            self.done = true;
                            Some(Err(SessionError::Io(e)))
                        }
                    };
                }
            }
        }
    }

    /// End of output: reap the client and report an abnormal exit.
    ///
    /// The client may keep running after closing its output, so teardown
    /// requests are still honoured while waiting for it.
    async fn finish(&mut self) -> Option<Result<String, SessionError>> {
        self.done = true;
        loop {
            tokio::select! {
                request = recv_teardown(&mut self.teardown) => match request {
                    Some(Teardown::Kill) => {
                        self.apply(Teardown::Kill);
                        debug!("ssh client killed after closing its output");
                        return None;
                    }
                    Some(request) => self.apply(request),
                    None => self.teardown = None,
                },
                status = self.child.wait() => {
                    return match status {
                        Ok(status) if status.success() || self.stopping => {
                            debug!("ssh client exited with {}", status);
                            None
                        }
                        Ok(status) => Some(Err(SessionError::Exited(status))),
                        Err(e) => Some(Err(SessionError::Io(e))),
                    };
                }
            }
        }
    }
}

async fn recv_teardown(receiver: &mut Option<mpsc::UnboundedReceiver<Teardown>>) -> Option<Teardown> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // id() is None once the child has been reaped
    if let Some(id) = child.id() {
        if let Err(e) = kill(Pid::from_raw(id as i32), Signal::SIGTERM) {
            debug!("Failed to send SIGTERM to ssh client: {}", e);
        }
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!("Failed to kill ssh client: {}", e);
    }
}

fn create_line_stream(output: ChildOutput) -> LineStream {
    Box::pin(futures::stream::unfold(output, |mut output| async move {
        let item = output.next_line().await?;
        Some((item, output))
    }))
}
