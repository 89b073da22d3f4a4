//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (active.rs)
//!     → Probe each backend (probe.rs, TCP connect with timeout)
//!     → Overwrite backend liveness in the registry
//!
//! Request path (resilience::retries)
//!     → Marks a backend dead after exhausting same-backend retries
//!     → Only the next probe cycle can bring it back
//! ```
//!
//! # Design Decisions
//! - Probe results overwrite state; no thresholds or hysteresis
//! - Probe failures are expected and only logged
//! - Backends are probed sequentially; a cycle takes at most len × timeout

pub mod active;
pub mod probe;

pub use active::HealthMonitor;
pub use probe::{Probe, TcpProbe};
