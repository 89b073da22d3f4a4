//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → tower-http request spans
//!
//! Consumers:
//!     → stdout, plain text or JSON lines (logging.rs)
//! ```

pub mod logging;
