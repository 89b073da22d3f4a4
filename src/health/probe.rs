//! Reachability probes.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Answers "is this host reachable" for a `host:port` pair.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, host_port: &str, timeout: Duration) -> bool;
}

/// Probe that succeeds when a TCP connection can be established.
///
/// The connection is dropped immediately; no bytes are exchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, host_port: &str, limit: Duration) -> bool {
        match timeout(limit, TcpStream::connect(host_port)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!(target_addr = %host_port, error = %e, "Probe connection failed");
                false
            }
            Err(_) => {
                tracing::debug!(target_addr = %host_port, timeout = ?limit, "Probe timed out");
                false
            }
        }
    }
}
