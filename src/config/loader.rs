//! Environment-based configuration loading
//!
//! | Variable | Meaning |
//! |---|---|
//! | `GERRIT_SERVER` | `user@host[:port]` of the Gerrit ssh daemon (required) |
//! | `SSH_PRIVATE_KEY_PATH` | key file handed to the ssh client |
//! | `GERRIT_SSH_COMMAND` | ssh client command line, `ssh` by default |
//! | `GERRIT_SUBSCRIPTIONS` | comma separated `stream-events -s` filters |
//! | `ARGO_SERVER` / `ARGO_NAMESPACE` | target of the forwarded events |
//! | `ARGO_TOKEN` | `Authorization` header value |
//! | `RECHECK_PATTERN` | replaces the recheck regex |
//! | `RECHECK_CI_PREFIX` | allows `<prefix> recheck` comments |
//! | `GATEWAY_DISPATCH_INTERVAL_MS` | pause between processed events |

use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::{ConfigError, GatewayConfig, RecheckConfig, RemoteTarget, SinkConfig};

pub const ENV_GERRIT_SERVER: &str = "GERRIT_SERVER";
pub const ENV_SSH_PRIVATE_KEY_PATH: &str = "SSH_PRIVATE_KEY_PATH";
pub const ENV_SSH_COMMAND: &str = "GERRIT_SSH_COMMAND";
pub const ENV_SUBSCRIPTIONS: &str = "GERRIT_SUBSCRIPTIONS";
pub const ENV_ARGO_SERVER: &str = "ARGO_SERVER";
pub const ENV_ARGO_NAMESPACE: &str = "ARGO_NAMESPACE";
pub const ENV_ARGO_TOKEN: &str = "ARGO_TOKEN";
pub const ENV_RECHECK_PATTERN: &str = "RECHECK_PATTERN";
pub const ENV_RECHECK_CI_PREFIX: &str = "RECHECK_CI_PREFIX";
pub const ENV_DISPATCH_INTERVAL_MS: &str = "GATEWAY_DISPATCH_INTERVAL_MS";

pub const DEFAULT_SSH_PROGRAM: &str = "ssh";
pub const DEFAULT_SUBSCRIPTIONS: &[&str] = &["patchset-created", "comment-added"];
pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_millis(100);

impl GatewayConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration through an arbitrary variable lookup.
    ///
    /// Only the remote target, the private key and values that must parse are
    /// validated here; a missing Argo server or namespace shows up as a failed
    /// request later on.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let remote: RemoteTarget = get(ENV_GERRIT_SERVER)
            .ok_or(ConfigError::MissingRemoteTarget)?
            .parse()?;

        let private_key = match get(ENV_SSH_PRIVATE_KEY_PATH) {
            Some(path) => Some(check_private_key(PathBuf::from(path))?),
            None => None,
        };

        let subscriptions = match get(ENV_SUBSCRIPTIONS) {
            Some(list) => parse_subscriptions(&list),
            None => DEFAULT_SUBSCRIPTIONS.iter().map(|s| s.to_string()).collect(),
        };

        let dispatch_interval = match get(ENV_DISPATCH_INTERVAL_MS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidDispatchInterval(raw))?,
            None => DEFAULT_DISPATCH_INTERVAL,
        };

        let ssh_program = match get(ENV_SSH_COMMAND) {
            Some(command) => check_ssh_command(command)?,
            None => DEFAULT_SSH_PROGRAM.to_string(),
        };

        let config = GatewayConfig {
            remote,
            private_key,
            ssh_program,
            sink: SinkConfig {
                server: lookup(ENV_ARGO_SERVER).unwrap_or_default(),
                namespace: lookup(ENV_ARGO_NAMESPACE).unwrap_or_default(),
                token: get(ENV_ARGO_TOKEN),
            },
            subscriptions,
            recheck: RecheckConfig {
                pattern: get(ENV_RECHECK_PATTERN),
                ci_prefix: get(ENV_RECHECK_CI_PREFIX).map(|p| p.trim().to_string()),
            },
            dispatch_interval,
        };

        debug!(
            remote = %config.remote,
            endpoint = %config.sink.endpoint_url(),
            subscriptions = ?config.subscriptions,
            "Resolved gateway configuration"
        );

        Ok(config)
    }
}

/// Split a comma separated subscription list, dropping empty entries
pub fn parse_subscriptions(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn check_private_key(path: PathBuf) -> Result<PathBuf, ConfigError> {
    match std::fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(source) => Err(ConfigError::PrivateKey { path, source }),
    }
}

/// Split the ssh client command line into program and leading arguments.
pub fn split_ssh_command(command: &str) -> Result<Vec<String>, ConfigError> {
    let words = shell_words::split(command)
        .map_err(|_| ConfigError::InvalidSshCommand(command.to_string()))?;
    if words.is_empty() {
        return Err(ConfigError::InvalidSshCommand(command.to_string()));
    }
    Ok(words)
}

fn check_ssh_command(command: String) -> Result<String, ConfigError> {
    split_ssh_command(&command)?;
    Ok(command)
}
