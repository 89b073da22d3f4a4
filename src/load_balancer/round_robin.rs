//! Round-robin load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, pool::BackendRegistry, LoadBalancer};

/// Round-robin selector that skips dead backends.
///
/// Holds no state of its own; the rotation cursor lives in the registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, registry: &BackendRegistry) -> Option<Arc<Backend>> {
        let len = registry.len();
        if len == 0 {
            return None;
        }

        let start = registry.advance_cursor() % len;

        for offset in 0..len {
            let index = (start + offset) % len;
            let backend = registry.get(index);
            if backend.is_alive() {
                // Resume after the live backend instead of re-skipping the dead ones.
                if offset != 0 {
                    registry.store_cursor(index + 1);
                }
                return Some(backend.clone());
            }
        }
        None
    }
}
