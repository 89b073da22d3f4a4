//! Retry and failover logic.
//!
//! # Responsibilities
//! - Retry transient forwarding failures against the same backend
//! - Mark a backend dead once its retries are spent and fail over
//! - Bound the number of failovers per request
//!
//! # State Machine
//! ```text
//! Dispatching ── failovers == max ──────────────▶ 503
//!      │ ── no live backend ────────────────────▶ 503
//!      ▼
//! Forwarding ── ok ─────────────────────────────▶ backend response
//!      │ ── request cannot be built ────────────▶ 502
//!      │ failure: same += 1
//!      ├─ same < max  → sleep(backoff), Forwarding (same backend)
//!      └─ same == max → mark dead, failovers += 1, same = 0, Dispatching
//! ```
//!
//! # Design Decisions
//! - Two separate counters: transient faults vs. a backend that is down
//! - Only transport failures count; HTTP error statuses are returned as-is
//! - State is per request and dies with it

use axum::body::Body;
use axum::http::Response;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::http::forward::{ForwardRequest, Forwarder};
use crate::load_balancer::{BackendRegistry, LoadBalancer};

/// Default bound for both same-backend retries and failovers.
pub const MAX_RETRIES: u32 = 3;

/// Limits applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            backoff: Duration::from_millis(10),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Counters threaded through one request's lifecycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Consecutive failed attempts against the current backend.
    pub same_backend_retries: u32,
    /// Backends abandoned so far for this request.
    pub failover_attempts: u32,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try the same backend again.
    RetrySame(Duration),
    /// Mark the backend dead and select another one.
    Failover,
}

impl RetryPolicy {
    /// Record a failed attempt and decide the next step.
    pub fn on_failure(&self, state: &mut RetryState) -> RetryDecision {
        state.same_backend_retries += 1;
        if state.same_backend_retries < self.max_retries {
            RetryDecision::RetrySame(self.backoff)
        } else {
            state.same_backend_retries = 0;
            state.failover_attempts += 1;
            RetryDecision::Failover
        }
    }

    /// Whether another backend may be selected.
    pub fn may_dispatch(&self, state: &RetryState) -> bool {
        state.failover_attempts < self.max_retries
    }
}

/// Why a request ended without a backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Exhausted {
    #[error("no live backend")]
    NoLiveBackend,

    #[error("gave up after {failovers} failovers")]
    RetriesExhausted { failovers: u32 },

    #[error("request cannot be forwarded")]
    Rejected,
}

/// Drives a request through selection, forwarding, retry and failover.
pub struct RetryDispatcher {
    registry: Arc<BackendRegistry>,
    selector: Arc<dyn LoadBalancer>,
    forwarder: Arc<dyn Forwarder>,
    policy: RetryPolicy,
}

impl RetryDispatcher {
    pub fn new(
        registry: Arc<BackendRegistry>,
        selector: Arc<dyn LoadBalancer>,
        forwarder: Arc<dyn Forwarder>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            selector,
            forwarder,
            policy,
        }
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Forward `request` until a backend answers or the policy gives up.
    pub async fn dispatch(&self, request: &ForwardRequest) -> Result<Response<Body>, Exhausted> {
        let mut state = RetryState::default();

        loop {
            if !self.policy.may_dispatch(&state) {
                tracing::info!(
                    method = %request.method,
                    uri = %request.path_and_query,
                    failovers = state.failover_attempts,
                    "Retries exhausted, responding 503"
                );
                return Err(Exhausted::RetriesExhausted {
                    failovers: state.failover_attempts,
                });
            }

            let backend = match self.selector.next_server(&self.registry) {
                Some(backend) => backend,
                None => {
                    tracing::info!(
                        method = %request.method,
                        uri = %request.path_and_query,
                        failovers = state.failover_attempts,
                        "No live backend, responding 503"
                    );
                    return Err(Exhausted::NoLiveBackend);
                }
            };

            loop {
                let error = match self.forwarder.forward(request, &backend.url).await {
                    Ok(response) => return Ok(response),
                    Err(e) if !e.is_transport() => {
                        tracing::warn!(
                            method = %request.method,
                            uri = %request.path_and_query,
                            backend = %backend.url,
                            error = %e,
                            "Request cannot be forwarded"
                        );
                        return Err(Exhausted::Rejected);
                    }
                    Err(e) => e,
                };

                match self.policy.on_failure(&mut state) {
                    RetryDecision::RetrySame(delay) => {
                        tracing::warn!(
                            method = %request.method,
                            uri = %request.path_and_query,
                            backend = %backend.url,
                            retry = state.same_backend_retries,
                            error = %error,
                            "Forwarding failed, retrying same backend"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::Failover => {
                        self.registry.mark_status(&backend.url, false);
                        tracing::warn!(
                            method = %request.method,
                            uri = %request.path_and_query,
                            backend = %backend.url,
                            attempt = state.failover_attempts,
                            error = %error,
                            "Backend marked down, failing over"
                        );
                        break;
                    }
                }
            }
        }
    }
}
