//! Shutdown signal handling

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::stream::StopHandle;

/// Exit status when a second signal cuts a pending shutdown short
pub const FORCED_EXIT_CODE: i32 = 130;

/// Stop the gateway on SIGINT or SIGTERM (Ctrl+C off unix).
///
/// Handlers are installed before this returns. The first signal requests a
/// clean stop; a second one exits right away with [`FORCED_EXIT_CODE`].
pub fn spawn_shutdown_listener(stop: StopHandle) -> std::io::Result<JoinHandle<()>> {
    let mut signals = ShutdownSignals::install()?;

    Ok(tokio::spawn(async move {
        let name = signals.recv().await;
        info!("Received {}, stopping", name);
        stop.stop();

        let name = signals.recv().await;
        warn!("Received {} again, exiting without a clean stop", name);
        std::process::exit(FORCED_EXIT_CODE);
    }))
}

#[cfg(unix)]
struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    }
}
