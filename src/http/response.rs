//! Response handling.
//!
//! # Responsibilities
//! - Pass backend responses through unmodified apart from hop-by-hop headers
//! - Build the fixed 503 returned on exhaustion
//! - Build the 502 returned when a request cannot be sent upstream
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Exhaustion responses never name a backend

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

/// Body sent with every 503.
pub const UNAVAILABLE_BODY: &str = "Service Unavailable";

/// Body sent with every 502.
pub const BAD_GATEWAY_BODY: &str = "Bad Gateway";

/// Convert an upstream response into one we can return to the client.
pub fn from_upstream(upstream: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = upstream.into_parts();
    super::headers::strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Terminal response once retries and failovers are spent.
pub fn service_unavailable() -> axum::response::Response {
    plain(StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_BODY)
}

/// Terminal response for a request no backend could be sent.
pub fn bad_gateway() -> axum::response::Response {
    plain(StatusCode::BAD_GATEWAY, BAD_GATEWAY_BODY)
}

fn plain(status: StatusCode, body: &'static str) -> axum::response::Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        body,
    )
        .into_response()
}
