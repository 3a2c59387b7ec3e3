//! Tower service adapter for the routing core.
//!
//! # Responsibilities
//! - Buffer the request body (bounded by the configured limit)
//! - Convert between `http` types and routing requests/responses
//! - Run the synchronous dispatch on Tokio's blocking pool
//! - Cap concurrent dispatches via semaphore
//!
//! # Design Decisions
//! - Body errors are answered before the routing core sees the request
//! - A lost blocking task is answered with the generic 500

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use http_body_util::LengthLimitError;
use tokio::sync::Semaphore;
use tower::Service;

use crate::http::request::request_id;
use crate::observability::metrics;
use crate::routing::{self, BoxAction};

const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;
const DEFAULT_MAX_CONCURRENCY: usize = 10_000;

/// Serves a routing action (usually a [`Handler`](crate::routing::Handler)
/// tree or a top-level [`Mux`](crate::routing::Mux)) as a `tower::Service`.
#[derive(Clone)]
pub struct RouterService {
    action: BoxAction,
    max_body_size: usize,
    /// Permits for in-flight dispatches.
    dispatch_limit: Arc<Semaphore>,
}

impl RouterService {
    pub fn new(action: BoxAction) -> Self {
        Self {
            action,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            dispatch_limit: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
        }
    }

    /// Limit the buffered request body to `max_body_size` bytes.
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Allow at most `max_concurrency` dispatches to run at once; further
    /// requests wait for a permit.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.dispatch_limit = Arc::new(Semaphore::new(max_concurrency));
        self
    }
}

impl Service<axum::http::Request<Body>> for RouterService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: axum::http::Request<Body>) -> Self::Future {
        let action = Arc::clone(&self.action);
        let dispatch_limit = Arc::clone(&self.dispatch_limit);
        let max_body_size = self.max_body_size;
        Box::pin(async move { Ok(dispatch(action, dispatch_limit, request, max_body_size).await) })
    }
}

async fn dispatch(
    action: BoxAction,
    dispatch_limit: Arc<Semaphore>,
    request: axum::http::Request<Body>,
    max_body_size: usize,
) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let request_id = request_id(&parts.headers).to_string();

    if declared_length(&parts.headers).is_some_and(|len| len > max_body_size) {
        tracing::warn!(request_id = %request_id, limit = max_body_size, "Request body too large");
        return finish(&method, start_time, routing::request::status_response(StatusCode::PAYLOAD_TOO_LARGE));
    }

    let bytes = match axum::body::to_bytes(body, max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let status = if is_length_limit(&e) {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            tracing::warn!(request_id = %request_id, error = %e, status = %status, "Failed to read request body");
            return finish(&method, start_time, routing::request::status_response(status));
        }
    };

    let request = routing::Request::new(parts.method, parts.uri.path())
        .with_headers(parts.headers)
        .with_body(bytes);

    tracing::debug!(request_id = %request_id, method = %method, path = %request.path(), "Routing request");

    let Ok(permit) = dispatch_limit.acquire_owned().await else {
        tracing::error!(request_id = %request_id, "Dispatch limiter closed");
        return finish(&method, start_time, routing::request::status_response(StatusCode::SERVICE_UNAVAILABLE));
    };

    // The blocking task owns the permit: a cancelled request frees its slot
    // only once the dispatch has actually finished.
    let blocking = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        action.call(request)
    });
    let response = match blocking.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Dispatch task failed");
            routing::request::internal_server_error()
        }
    };

    finish(&method, start_time, response)
}

fn finish(method: &axum::http::Method, start_time: Instant, response: routing::Response) -> Response {
    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response.map(Body::from)
}

fn declared_length(headers: &axum::http::HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = Some(err as &(dyn std::error::Error + 'static));
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::request::text;
    use crate::routing::{Handler, Request as RoutingRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    fn service() -> RouterService {
        let handler = Handler::new()
            .create(|req: RoutingRequest| {
                text(StatusCode::CREATED, String::from_utf8_lossy(req.body()).into_owned())
            })
            .show(|req: RoutingRequest| text(StatusCode::OK, format!("show {}", req.path())));
        RouterService::new(Arc::new(handler)).with_max_body_size(8)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatches_through_handler() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("hello"))
            .unwrap();
        let response = service().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_text(response).await, "hello");
    }

    #[tokio::test]
    async fn test_query_string_is_not_part_of_path() {
        let request = axum::http::Request::builder()
            .uri("/42?verbose=1")
            .body(Body::empty())
            .unwrap();
        let response = service().oneshot(request).await.unwrap();
        assert_eq!(body_text(response).await, "show /");
    }

    #[tokio::test]
    async fn test_rejects_oversized_body() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_LENGTH, "9")
            .body(Body::from("123456789"))
            .unwrap();
        let response = service().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_rejects_oversized_body_without_length() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("123456789"))
            .unwrap();
        let response = service().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cancelled_requests_hold_permit_until_dispatch_ends() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let handler = {
            let (active, peak) = (Arc::clone(&active), Arc::clone(&peak));
            Handler::new().list(move |_req: RoutingRequest| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(200));
                active.fetch_sub(1, Ordering::SeqCst);
                text(StatusCode::OK, "done")
            })
        };
        let service = RouterService::new(Arc::new(handler)).with_max_concurrency(1);

        for _ in 0..3 {
            let request = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();
            let result =
                tokio::time::timeout(Duration::from_millis(50), service.clone().oneshot(request)).await;
            assert!(result.is_err());
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }
}
