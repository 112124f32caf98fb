//! Broker relay service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                    BROKER RELAY                      │
//!                      │                                                      │
//!     Client Request   │  ┌───────────┐   ┌────────────┐   ┌──────────────┐   │
//!     ─────────────────┼─▶│  request  │──▶│ event_log  │──▶│    relay     │   │
//!                      │  │ corr. id  │   │ middleware │   │   handlers   │   │
//!                      │  └───────────┘   └─────┬──────┘   └──────┬───────┘   │
//!                      │                        │                 │           │
//!                      │                        ▼                 ▼           │
//!                      │                 ┌────────────┐   ┌──────────────┐   │
//!                      │                 │   events   │   │  publisher / │   │
//!                      │                 │   logger   │──▶│   consumer   │   │
//!                      │                 └────────────┘   └──────┬───────┘   │
//!                      │                                         │           │
//!                      │                                         ▼           │      ┌──────────┐
//!                      │                                  ┌──────────────┐   │      │  AMQP    │
//!                      │                                  │    broker    │───┼─────▶│  broker  │
//!                      │                                  │    handle    │   │      └──────────┘
//!                      │                                  └──────────────┘   │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use broker_relay::config::load_config;
use broker_relay::lifecycle::signals::forward_signals;
use broker_relay::observability::{logging, metrics};
use broker_relay::Service;

#[derive(Parser)]
#[command(name = "broker-relay")]
#[command(about = "Message broker relay with request event logging", long_about = None)]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long, env = "BROKER_RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("broker-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = ?config.broker.backend,
        exchange = %config.broker.exchange,
        queue = %config.broker.queue,
        event_log = config.event_log.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let service = Service::build(config).await;
    tokio::spawn(forward_signals(service.shutdown()));
    service.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
