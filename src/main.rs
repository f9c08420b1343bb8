//! `kafka-proxy`: HTTP-to-Kafka bridge.
//!
//! Accepts `POST /addresses` submissions, publishes each one to Kafka and
//! reports counters on `GET /status`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use addr_proxies::config::validation::validate_bridge_config;
use addr_proxies::config::{load_bridge_config, override_tls_paths, ConfigError};
use addr_proxies::http::BridgeServer;
use addr_proxies::kafka::{tls, KafkaProducer, MessageForwarder};
use addr_proxies::lifecycle::{shutdown_signal, Shutdown};
use addr_proxies::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "kafka-proxy")]
#[command(about = "HTTP-to-Kafka bridge for address submissions", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to Kafka certificate.
    #[arg(long)]
    cert: Option<String>,

    /// Path to Kafka key.
    #[arg(long)]
    key: Option<String>,

    /// Address to listen on.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_bridge_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability.log_level);

    override_tls_paths(&mut config.kafka.tls, cli.cert, cli.key);
    if let Some(listen) = cli.listen {
        config.listener.bind_address = listen;
    }
    validate_bridge_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        brokers = ?config.kafka.brokers,
        topic = %config.kafka.topic,
        "Configuration loaded"
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

    let tls = tls::load_client_config(&config.kafka.tls)?;
    let producer = KafkaProducer::connect(&config.kafka, tls).await?;
    let forwarder = MessageForwarder::new(Arc::new(producer));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on(shutdown_signal());

    let server = BridgeServer::new(&config.listener, forwarder);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
