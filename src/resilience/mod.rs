//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → forward attempt (per-attempt timeouts live in http::forward)
//!     → On failure: retries.rs (retry same backend with fixed backoff)
//!     → After max retries: mark backend dead, fail over to the next live one
//!     → After max failovers: 503
//! ```
//!
//! # Design Decisions
//! - Every request terminates: attempts are bounded by max × max
//! - A request's failures only touch the backend it was using
//! - Health probes, not requests, bring backends back

pub mod retries;

pub use retries::{Exhausted, RetryDispatcher, RetryPolicy, RetryState, MAX_RETRIES};
