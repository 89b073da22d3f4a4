//! Tiny backend for trying the balancer by hand.
//!
//! ```text
//! cargo run --example mock_backend -- 3031
//! cargo run --example mock_backend -- 3032
//! cargo run -- --backends http://127.0.0.1:3031,http://127.0.0.1:3032 --port 3030
//! curl http://127.0.0.1:3030/
//! ```

use axum::{extract::State, http::Uri, Router};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = std::env::args()
        .nth(1)
        .map(|p| p.parse())
        .transpose()?
        .unwrap_or(3031);

    let app = Router::new()
        .fallback(|State(port): State<u16>, uri: Uri| async move {
            format!("backend {} served {}\n", port, uri)
        })
        .with_state(port);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Mock backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
