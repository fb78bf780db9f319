//! Gateway configuration
//!
//! Everything the gateway needs is resolved once at startup from the
//! process environment and is immutable afterwards. See [`loader`] for the
//! variable names.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod loader;
pub mod remote;

#[cfg(test)]
mod tests;

pub use loader::{
    DEFAULT_DISPATCH_INTERVAL, DEFAULT_SSH_PROGRAM, DEFAULT_SUBSCRIPTIONS, ENV_ARGO_NAMESPACE,
    ENV_ARGO_SERVER, ENV_ARGO_TOKEN, ENV_DISPATCH_INTERVAL_MS, ENV_GERRIT_SERVER,
    ENV_RECHECK_CI_PREFIX, ENV_RECHECK_PATTERN, ENV_SSH_COMMAND, ENV_SSH_PRIVATE_KEY_PATH,
    ENV_SUBSCRIPTIONS, parse_subscriptions, split_ssh_command,
};
pub use remote::RemoteTarget;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("GERRIT_SERVER needs to be set to `user@host[:port]`")]
    MissingRemoteTarget,

    #[error("Invalid remote target {0:?}, expected `user@host[:port]`")]
    InvalidRemoteTarget(String),

    #[error("Invalid port in remote target {0:?}")]
    InvalidPort(String),

    #[error("Cannot read private key {path:?}: {source}")]
    PrivateKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid recheck pattern: {0}")]
    InvalidRecheckPattern(#[from] regex::Error),

    #[error("Invalid dispatch interval {0:?}, expected milliseconds")]
    InvalidDispatchInterval(String),

    #[error("Invalid ssh command {0:?}")]
    InvalidSshCommand(String),
}

/// Where accepted events are posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkConfig {
    /// Host (and optional port) of the Argo server
    pub server: String,
    /// Argo namespace that owns the event source
    pub namespace: String,
    /// Value of the `Authorization` header, sent verbatim
    pub token: Option<String>,
}

impl SinkConfig {
    /// Webhook URL of the gerrit event source
    pub fn endpoint_url(&self) -> String {
        format!(
            "https://{}/api/v1/events/{}/gerrit",
            self.server, self.namespace
        )
    }
}

/// Tuning of the recheck comment detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecheckConfig {
    /// Replaces the built-in pattern entirely when set
    pub pattern: Option<String>,
    /// CI token allowed in front of `recheck`, e.g. `sap-openstack-ci`
    pub ci_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub remote: RemoteTarget,
    pub private_key: Option<PathBuf>,
    /// ssh client command line, possibly with extra options
    pub ssh_program: String,
    pub sink: SinkConfig,
    /// Event types requested from `gerrit stream-events`
    pub subscriptions: Vec<String>,
    pub recheck: RecheckConfig,
    /// Pause between two processed events
    pub dispatch_interval: Duration,
}

impl GatewayConfig {
    /// Minimal configuration for a remote target, everything else defaulted.
    pub fn new(remote: RemoteTarget) -> Self {
        Self {
            remote,
            private_key: None,
            ssh_program: DEFAULT_SSH_PROGRAM.to_string(),
            sink: SinkConfig::default(),
            subscriptions: DEFAULT_SUBSCRIPTIONS.iter().map(|s| s.to_string()).collect(),
            recheck: RecheckConfig::default(),
            dispatch_interval: DEFAULT_DISPATCH_INTERVAL,
        }
    }

    pub fn with_sink(mut self, sink: SinkConfig) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_subscriptions(mut self, subscriptions: Vec<String>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    pub fn with_recheck(mut self, recheck: RecheckConfig) -> Self {
        self.recheck = recheck;
        self
    }
}
