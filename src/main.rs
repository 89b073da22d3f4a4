//! HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                  LOAD BALANCER                   │
//!                     │                                                  │
//!   Client Request    │  ┌─────────┐   ┌────────────┐   ┌─────────────┐  │
//!   ──────────────────┼─▶│  http   │──▶│ resilience │──▶│load_balancer│  │
//!                     │  │ server  │   │ dispatcher │◀──│ round robin │  │
//!                     │  └─────────┘   └─────┬──────┘   └──────▲──────┘  │
//!                     │                      │ forward         │ liveness│
//!   Client Response   │                      ▼                 │         │
//!   ◀─────────────────┼──────────────── http::forward ───────▶ registry ◀┼── health monitor
//!                     │                      │                           │   (TCP probes)
//!                     └──────────────────────┼───────────────────────────┘
//!                                            ▼
//!                                     Backend Servers
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use http_balancer::config::loader::{read_config, ConfigError};
use http_balancer::config::{BalancerConfig, ListenerConfig};
use http_balancer::lifecycle::{bootstrap, signals, Shutdown, StartupError};
use http_balancer::observability::logging;

#[derive(Debug, Parser)]
#[command(name = "http-balancer")]
#[command(
    about = "Round-robin HTTP load balancer with health checks and failover",
    long_about = None
)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backends to load balance, separated by commas.
    #[arg(short, long, value_delimiter = ',')]
    backends: Vec<String>,

    /// Port to listen on (all interfaces).
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    /// Read the config file, if any, then apply command-line overrides.
    fn into_config(self) -> Result<BalancerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => BalancerConfig::default(),
        };

        let backends: Vec<String> = self
            .backends
            .into_iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        if !backends.is_empty() {
            config.backends = backends;
        }
        if let Some(port) = self.port {
            config.listener = ListenerConfig::with_port(port);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if self.json_logs {
            config.observability.json = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Cli::parse().into_config();

    let observability = config
        .as_ref()
        .map(|c| c.observability.clone())
        .unwrap_or_default();
    logging::init(&observability);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Load balancer exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: BalancerConfig) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        health_interval_secs = config.health_check.interval_secs,
        max_retries = config.retries.max_retries,
        "Configuration loaded"
    );

    let (server, listener) = bootstrap(&config).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown).await.map_err(StartupError::Serve)
}
