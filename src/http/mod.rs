//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → request.rs (add request ID)
//!     → forward.rs (snapshot request, rewrite URI, send to backend)
//!     → headers.rs (strip hop-by-hop, X-Forwarded-For)
//!     → response.rs (pass through, or 503 on exhaustion)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardError, ForwardRequest, Forwarder, HyperForwarder};
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
