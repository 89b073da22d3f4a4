//! Forwarding a buffered request to one backend.
//!
//! # Responsibilities
//! - Snapshot an inbound request so it can be replayed on every attempt
//! - Rewrite the target URI onto the chosen backend
//! - Report transport failures; any HTTP response counts as success

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, request, HeaderMap, HeaderValue, Method, Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time;
use url::{Position, Url};

use crate::config::schema::TimeoutConfig;
use crate::http::{headers, response};

/// Failure forwarding one attempt.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),
}

impl ForwardError {
    /// Whether the attempt failed on the wire and may succeed if repeated.
    ///
    /// `InvalidTarget` is raised before anything is sent and says nothing
    /// about the backend's health.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::InvalidTarget(_))
    }
}

/// Sends one attempt of a request to a backend.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        request: &ForwardRequest,
        backend: &Url,
    ) -> Result<Response<Body>, ForwardError>;
}

/// Owned copy of an inbound request, replayable across attempts.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Origin-form target, e.g. `/search?q=1`.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardRequest {
    /// Build from an inbound request head and its buffered body.
    pub fn from_parts(parts: &request::Parts, body: Bytes, client: Option<SocketAddr>) -> Self {
        let mut headers = parts.headers.clone();
        headers::strip_hop_by_hop(&mut headers);
        if let Some(client) = client {
            headers::append_forwarded_for(&mut headers, client.ip());
        }
        if !body.is_empty() {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            method: parts.method.clone(),
            path_and_query,
            headers,
            body,
        }
    }

    /// Absolute URI of this request on `backend`.
    ///
    /// The backend path prefixes the request path with exactly one slash
    /// between them; both query strings are kept.
    pub fn target_uri(&self, backend: &Url) -> Result<Uri, ForwardError> {
        let (path, query) = match self.path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.path_and_query.as_str(), None),
        };

        let mut target = format!(
            "{}{}",
            &backend[..Position::BeforePath],
            join_paths(backend.path(), path)
        );

        let query = match (
            backend.query().filter(|q| !q.is_empty()),
            query.filter(|q| !q.is_empty()),
        ) {
            (Some(a), Some(b)) => Some(format!("{}&{}", a, b)),
            (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
            (None, None) => None,
        };
        if let Some(query) = query {
            target.push('?');
            target.push_str(&query);
        }

        target
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| ForwardError::InvalidTarget(e.to_string()))
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Forwarder backed by a pooled hyper client.
#[derive(Clone)]
pub struct HyperForwarder {
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
}

impl HyperForwarder {
    pub fn new(config: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            request_timeout: Duration::from_secs(config.request_secs),
        }
    }
}

#[async_trait]
impl Forwarder for HyperForwarder {
    async fn forward(
        &self,
        request: &ForwardRequest,
        backend: &Url,
    ) -> Result<Response<Body>, ForwardError> {
        let uri = request.target_uri(backend)?;

        let mut builder = Request::builder().method(request.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            *headers = request.headers.clone();
        }
        let req = builder
            .body(Body::from(request.body.clone()))
            .map_err(|e| ForwardError::InvalidTarget(e.to_string()))?;

        match time::timeout(self.request_timeout, self.client.request(req)).await {
            Ok(Ok(upstream)) => Ok(response::from_upstream(upstream)),
            Ok(Err(e)) => Err(ForwardError::Upstream(e)),
            Err(_) => Err(ForwardError::Timeout(self.request_timeout)),
        }
    }
}
