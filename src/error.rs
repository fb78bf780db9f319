use thiserror::Error;

use crate::config::ConfigError;
use crate::forwarder::ForwardError;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Failed to decode stream line {line:?}: {source}")]
    Decode {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stream line is not a JSON object: {0:?}")]
    NotAnObject(String),

    #[error("Forwarding failed: {0}")]
    Forward(#[from] ForwardError),

    #[error("Gateway already started; event streams are not restartable")]
    AlreadyStarted,
}

impl GatewayError {
    /// Process exit code used when this error ends the program.
    pub fn exit_code(&self) -> i32 {
        match self {
            GatewayError::Config(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
