//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request dispatch
//!     → round_robin.rs (advance cursor, scan for a live backend)
//!     → pool.rs (ordered registry, shared cursor)
//!     → backend.rs (per-backend liveness flag)
//!     → Return a backend, or none when everything is down
//! ```
//!
//! # Design Decisions
//! - Selector is stateless; the registry owns the cursor
//! - Registry is immutable in shape after startup, so reads are lock-free
//! - Dead backends are skipped, never removed

use std::sync::Arc;

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::BackendRegistry;
pub use round_robin::RoundRobin;

/// Backend selection strategy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next backend to try, or `None` when no backend is alive.
    fn next_server(&self, registry: &BackendRegistry) -> Option<Arc<Backend>>;
}
