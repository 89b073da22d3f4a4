//! Backend registry.
//!
//! # Responsibilities
//! - Hold the ordered, fixed set of backends
//! - Own the shared rotation cursor
//! - Update liveness by backend identity

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::load_balancer::backend::Backend;

/// Ordered collection of backends plus the rotation cursor.
///
/// The sequence is only appended to during startup. Once shared it never changes
/// shape, so reads need no lock; liveness lives inside each backend.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<Backend>>,
    cursor: AtomicUsize,
}

impl BackendRegistry {
    /// Create an empty registry. Fill it with [`add`](Self::add) before sharing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from canonical backend URLs, preserving order.
    ///
    /// Returns `None` for an empty list.
    pub fn from_urls(urls: impl IntoIterator<Item = Url>) -> Option<Self> {
        let mut registry = Self::new();
        for url in urls {
            registry.add(Backend::new(url));
        }
        if registry.is_empty() {
            None
        } else {
            Some(registry)
        }
    }

    /// Append a backend. Initialization only.
    pub fn add(&mut self, backend: Backend) {
        self.backends.push(Arc::new(backend));
    }

    /// Set liveness of the first backend whose URL equals `url`.
    ///
    /// Returns false when no backend matched.
    pub fn mark_status(&self, url: &Url, alive: bool) -> bool {
        match self.backends.iter().find(|b| b.url == *url) {
            Some(backend) => {
                backend.set_alive(alive);
                true
            }
            None => false,
        }
    }

    /// Backend at `index`. Callers normalize the index with `% len()`.
    pub fn get(&self, index: usize) -> &Arc<Backend> {
        &self.backends[index]
    }

    /// Number of backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// True if no backend was added.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// All backends in rotation order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Atomically advance the cursor, returning the position it held before.
    pub(crate) fn advance_cursor(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed)
    }

    /// Move the cursor so the next advance starts at `position`.
    pub(crate) fn store_cursor(&self, position: usize) {
        self.cursor.store(position, Ordering::Relaxed);
    }
}
