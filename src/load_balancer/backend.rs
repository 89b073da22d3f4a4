//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server by its canonical URL
//! - Track liveness, written by health probes and retry exhaustion

use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Canonical upstream URL; the backend's identity.
    pub url: Url,
    alive: AtomicBool,
}

impl Backend {
    /// Create a new backend. Backends start alive.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            alive: AtomicBool::new(true),
        }
    }

    /// Return true if the backend may receive traffic.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Overwrite liveness, returning the previous value.
    pub fn set_alive(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::AcqRel)
    }

    /// `host:port` used for reachability probes.
    pub fn host_port(&self) -> Option<String> {
        let host = self.url.host_str()?;
        let port = self.url.port_or_known_default()?;
        Some(format!("{}:{}", host, port))
    }
}
