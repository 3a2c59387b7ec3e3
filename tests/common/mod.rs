//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use rest_mount::config::ServerConfig;
use rest_mount::routing::request::text;
use rest_mount::routing::{BoxAction, Request, Response};
use rest_mount::{HttpServer, Shutdown};
use axum::http::StatusCode;

/// Action answering `200` with a fixed body.
#[allow(dead_code)]
pub fn reply(body: &'static str) -> impl Fn(Request) -> Response + Send + Sync + 'static {
    move |_req: Request| text(StatusCode::OK, body)
}

/// Body of a routing response as UTF-8.
#[allow(dead_code)]
pub fn body(response: &Response) -> String {
    String::from_utf8(response.body().to_vec()).unwrap()
}

/// Start an `HttpServer` on an ephemeral port.
///
/// Returns the bound address and the shutdown coordinator; the server stops
/// when the coordinator is triggered or dropped.
#[allow(dead_code)]
pub async fn start_server(config: ServerConfig, action: BoxAction) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, action);
    tokio::spawn(server.run(listener, shutdown.wait()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}
