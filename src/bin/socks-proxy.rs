//! `socks-proxy`: SOCKSv5 proxy that only tunnels to allow-listed destinations.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use addr_proxies::config::validation::validate_gate_config;
use addr_proxies::config::{load_gate_config, ConfigError};
use addr_proxies::lifecycle::{shutdown_signal, Shutdown};
use addr_proxies::net::Listener;
use addr_proxies::observability::{logging, metrics};
use addr_proxies::socks::{AllowListRule, GatingProxy};

#[derive(Parser)]
#[command(name = "socks-proxy")]
#[command(about = "Allow-list gated SOCKSv5 proxy", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    addr: Option<String>,

    /// Additional destination IP to allow (repeatable).
    #[arg(long = "allow-ip")]
    allow_ips: Vec<String>,

    /// Additional destination FQDN to allow (repeatable).
    #[arg(long = "allow-fqdn")]
    allow_fqdns: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_gate_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability.log_level);

    if let Some(addr) = cli.addr {
        config.listener.bind_address = addr;
    }
    config.allow_list.ips.extend(cli.allow_ips);
    config.allow_list.fqdns.extend(cli.allow_fqdns);
    validate_gate_config(&config).map_err(ConfigError::Validation)?;

    let rule = AllowListRule::from_config(&config.allow_list)?;
    tracing::info!(
        allowed_ips = ?rule.allowed_ips().collect::<Vec<_>>(),
        allowed_fqdns = ?rule.allowed_fqdns().collect::<Vec<_>>(),
        "Allow-list loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on(shutdown_signal());

    let proxy = GatingProxy::new(Arc::new(rule));
    proxy.run(listener, shutdown.subscribe()).await;

    tracing::info!(
        open_tunnels = proxy.active_connections(),
        "Shutdown complete"
    );
    Ok(())
}
