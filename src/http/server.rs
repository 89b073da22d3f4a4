//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all handler
//! - Wire up middleware (tracing, request ID)
//! - Buffer each request so it can be replayed across attempts
//! - Hand requests to the retry dispatcher
//! - Spawn the health monitor alongside the serve loop

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{BalancerConfig, HealthCheckConfig};
use crate::health::HealthMonitor;
use crate::http::forward::{ForwardRequest, Forwarder, HyperForwarder};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BackendRegistry, RoundRobin};
use crate::resilience::retries::{Exhausted, RetryDispatcher, RetryPolicy};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<RetryDispatcher>,
    pub max_body_bytes: usize,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    registry: Arc<BackendRegistry>,
    health_config: HealthCheckConfig,
}

impl HttpServer {
    /// Create a server forwarding through a pooled hyper client.
    pub fn new(registry: Arc<BackendRegistry>, config: &BalancerConfig) -> Self {
        let forwarder = Arc::new(HyperForwarder::new(&config.timeouts));
        Self::with_forwarder(registry, config, forwarder)
    }

    /// Create a server with a custom forwarding adapter.
    pub fn with_forwarder(
        registry: Arc<BackendRegistry>,
        config: &BalancerConfig,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        let dispatcher = RetryDispatcher::new(
            registry.clone(),
            Arc::new(RoundRobin::new()),
            forwarder,
            RetryPolicy::from(&config.retries),
        );

        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            max_body_bytes: config.limits.max_body_bytes,
        };

        Self {
            router: Self::build_router(state),
            registry,
            health_config: config.health_check.clone(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The registry shared by the dispatcher and the health monitor.
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.registry.len(),
            "Load balancer started"
        );

        if self.health_config.enabled {
            let monitor = HealthMonitor::new(self.registry.clone(), &self.health_config);
            tokio::spawn(monitor.run(shutdown.subscribe()));
        } else {
            tracing::info!("Active health checks disabled");
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let mut stop = shutdown.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes to a backend.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (parts, body) = request.into_parts();

    tracing::debug!(
        request_id = %parts.headers.request_id(),
        method = %parts.method,
        uri = %parts.uri,
        "Proxying request"
    );

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                request_id = %parts.headers.request_id(),
                error = %e,
                "Failed to buffer request body"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let forward = ForwardRequest::from_parts(&parts, body, client);

    match state.dispatcher.dispatch(&forward).await {
        Ok(response) => response,
        Err(Exhausted::Rejected) => response::bad_gateway(),
        Err(_) => response::service_unavailable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::forward::ForwardError;
    use crate::http::request::X_REQUEST_ID;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tower::ServiceExt;
    use url::Url;

    /// Echoes the forwarded request back as the response body.
    #[derive(Default)]
    struct EchoForwarder {
        seen: Mutex<Vec<ForwardRequest>>,
    }

    #[async_trait]
    impl Forwarder for EchoForwarder {
        async fn forward(
            &self,
            request: &ForwardRequest,
            backend: &Url,
        ) -> Result<Response<Body>, ForwardError> {
            self.seen.lock().unwrap().push(request.clone());
            let body = format!("{} {} {}", backend, request.method, request.path_and_query);
            Ok(axum::http::Response::builder()
                .status(StatusCode::IM_A_TEAPOT)
                .body(Body::from(body))
                .unwrap())
        }
    }

    fn server(forwarder: Arc<dyn Forwarder>) -> HttpServer {
        let config = BalancerConfig {
            backends: vec!["http://127.0.0.1:9001".into()],
            ..Default::default()
        };
        let registry = Arc::new(
            BackendRegistry::from_urls([Url::parse("http://127.0.0.1:9001").unwrap()]).unwrap(),
        );
        HttpServer::with_forwarder(registry, &config, forwarder)
    }

    #[tokio::test]
    async fn test_forwards_any_path_and_method() {
        let forwarder = Arc::new(EchoForwarder::default());
        let app = server(forwarder.clone()).router();

        let res = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/items/7?force=1")
                    .body(Body::from("payload"))
                    .unwrap(),
            )
            .await
            .unwrap();

        // Backend status passes through untouched.
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
        assert!(res.headers().contains_key(X_REQUEST_ID));

        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"http://127.0.0.1:9001/ DELETE /items/7?force=1");

        let seen = forwarder.seen.lock().unwrap();
        assert_eq!(&seen[0].body[..], b"payload");
        assert!(seen[0].headers.contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_client_request_id_preserved() {
        let app = server(Arc::new(EchoForwarder::default())).router();

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(X_REQUEST_ID, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()[X_REQUEST_ID], "req-42");
    }

    #[tokio::test]
    async fn test_no_live_backend_is_503() {
        let forwarder = Arc::new(EchoForwarder::default());
        let server = server(forwarder.clone());
        server.registry().get(0).set_alive(false);

        let res = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], response::UNAVAILABLE_BODY.as_bytes());
        assert!(forwarder.seen.lock().unwrap().is_empty());
    }

    /// Fails every attempt before anything reaches the wire.
    struct UnbuildableForwarder;

    #[async_trait]
    impl Forwarder for UnbuildableForwarder {
        async fn forward(
            &self,
            _request: &ForwardRequest,
            _backend: &Url,
        ) -> Result<Response<Body>, ForwardError> {
            Err(ForwardError::InvalidTarget("bad target".into()))
        }
    }

    #[tokio::test]
    async fn test_unforwardable_request_is_502() {
        let server = server(Arc::new(UnbuildableForwarder));

        let res = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert!(server.registry().get(0).is_alive());
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = BalancerConfig::default();
        config.limits.max_body_bytes = 4;
        let registry = Arc::new(
            BackendRegistry::from_urls([Url::parse("http://127.0.0.1:9001").unwrap()]).unwrap(),
        );
        let forwarder = Arc::new(EchoForwarder::default());
        let app = HttpServer::with_forwarder(registry, &config, forwarder.clone()).router();

        let res = app
            .oneshot(Request::builder().uri("/").body(Body::from("too long")).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(forwarder.seen.lock().unwrap().is_empty());
    }
}
