use anyhow::Context;
use clap::Parser;
use tracing::debug;

use gerrit_argo_gateway::app::{
    handle_fatal_error, init_logging, spawn_shutdown_listener, AppConfig,
};
use gerrit_argo_gateway::config::{parse_subscriptions, GatewayConfig};
use gerrit_argo_gateway::Gateway;

/// Forward Gerrit stream-events to an Argo Events webhook
#[derive(Parser)]
#[command(name = "gerrit-argo-gateway", version)]
#[command(about = "Relay Gerrit stream-events to Argo Events", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Event types to subscribe to, overriding GERRIT_SUBSCRIPTIONS
    /// (repeatable or comma separated)
    #[arg(short, long = "subscription", value_name = "TYPE")]
    subscriptions: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app_config = AppConfig::new(cli.verbose);
    init_logging(&app_config);

    if let Err(e) = run(cli).await {
        handle_fatal_error(e, app_config.verbose);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GatewayConfig::from_env()
        .map_err(gerrit_argo_gateway::GatewayError::from)
        .context("Failed to load configuration")?;

    if !cli.subscriptions.is_empty() {
        let subscriptions = cli
            .subscriptions
            .iter()
            .flat_map(|list| parse_subscriptions(list))
            .collect();
        config = config.with_subscriptions(subscriptions);
    }

    let gateway = Gateway::from_config(&config)?;
    let listener = spawn_shutdown_listener(gateway.stop_handle())
        .context("Failed to install signal handlers")?;

    let summary = gateway.run().await;
    listener.abort();

    let summary = summary?;
    debug!("Gateway finished: {:?}", summary);
    Ok(())
}
