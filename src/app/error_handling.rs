//! Error handling utilities

use tracing::error;

use crate::error::GatewayError;

/// Report a fatal error and exit.
///
/// Gateway errors pick their own exit code (2 for configuration problems,
/// 1 otherwise); anything else exits with 1. With `-v` the full cause
/// chain is printed as well.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    eprintln!("Error: {error:#}");

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(exit_code(&error))
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<GatewayError>()
        .map(GatewayError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::forwarder::ForwardError;

    #[test]
    fn test_exit_codes() {
        let config = anyhow::Error::from(GatewayError::from(ConfigError::MissingRemoteTarget));
        assert_eq!(exit_code(&config), 2);

        let forward = anyhow::Error::from(GatewayError::from(ForwardError::Status {
            status: 500,
            body: String::new(),
        }));
        assert_eq!(exit_code(&forward), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("something else")), 1);
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::from(GatewayError::from(ConfigError::MissingRemoteTarget))
            .context("loading configuration");
        assert_eq!(exit_code(&err), 2);
    }
}
