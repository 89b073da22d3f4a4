//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend
//! - Overwrite backend liveness with the probe result

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::probe::{Probe, TcpProbe};
use crate::load_balancer::BackendRegistry;

pub struct HealthMonitor {
    registry: Arc<BackendRegistry>,
    probe: Arc<dyn Probe>,
    interval: Duration,
    timeout: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Arc<BackendRegistry>, config: &HealthCheckConfig) -> Self {
        Self::with_probe(registry, config, Arc::new(TcpProbe))
    }

    pub fn with_probe(
        registry: Arc<BackendRegistry>,
        config: &HealthCheckConfig,
        probe: Arc<dyn Probe>,
    ) -> Self {
        Self {
            registry,
            probe,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Probe on a fixed period until shutdown. The first cycle runs one period
    /// after start; backends begin alive.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.interval,
            timeout = ?self.timeout,
            backends = self.registry.len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one health-check cycle over all backends, sequentially.
    pub async fn check_all(&self) {
        tracing::info!("Checking backends");

        for backend in self.registry.backends() {
            let alive = match backend.host_port() {
                Some(host_port) => self.probe.probe(&host_port, self.timeout).await,
                None => false,
            };
            let was_alive = backend.set_alive(alive);
            let changed = was_alive != alive;

            if alive {
                tracing::info!(backend = %backend.url, status = "up", changed, "Backend status");
            } else {
                tracing::warn!(backend = %backend.url, status = "down", changed, "Backend status");
            }
        }

        tracing::info!("Checking backends done");
    }
}
