use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote process output was not captured")]
    MissingStdout,

    #[error("Session already runs a process")]
    ProcessAlreadyOpen,

    #[error("Remote session ended with {0}")]
    Exited(ExitStatus),

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Failed to terminate remote process: {0}")]
    Terminate(String),

    #[error("Failed to close session: {0}")]
    Close(String),
}
