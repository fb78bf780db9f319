use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use super::ConfigError;

pub const DEFAULT_SSH_PORT: u16 = 22;

// Example: myuser@yourhost:29418
static REMOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<username>[^@]+)@(?P<host>[^:@]+)(?::(?P<port>\d+))?$")
        .expect("Invalid regex pattern")
});

/// The `user@host[:port]` the event stream is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub username: String,
    pub host: String,
    pub port: u16,
}

impl RemoteTarget {
    /// `user@host` as understood by ssh clients
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

impl FromStr for RemoteTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let captures = REMOTE_RE
            .captures(s)
            .ok_or_else(|| ConfigError::InvalidRemoteTarget(s.to_string()))?;

        let port = match captures.name("port") {
            Some(port) => port
                .as_str()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(s.to_string()))?,
            None => DEFAULT_SSH_PORT,
        };

        Ok(Self {
            username: captures["username"].to_string(),
            host: captures["host"].to_string(),
            port,
        })
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}
