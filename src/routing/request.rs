//! Request and response types flowing through the dispatcher.
//!
//! # Design Decisions
//! - Requests are passed by value; every derivation returns a new request
//! - Bodies are buffered `Bytes`, so cloning a request never copies payload
//! - Responses are plain `http::Response<Bytes>` to stay transport agnostic

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;

use super::context::{Context, ContextKey};

/// Response produced by actions.
pub type Response = axum::http::Response<Bytes>;

/// A request as seen by the dispatcher and its actions.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    context: Context,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            context: Context::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Derive a request addressing `path`.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Derive a request carrying `context`.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Shorthand for `self.context().get(key)`.
    pub fn value<T>(&self, key: &ContextKey<T>) -> Option<&T>
    where
        T: std::any::Any + Send + Sync,
    {
        self.context.get(key)
    }
}

/// Plain text response.
pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    let mut response = Response::new(Bytes::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// JSON response. Falls back to the generic 500 when `value` cannot be
/// serialized.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::new(Bytes::from(body));
            *response.status_mut() = status;
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            status_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Response whose body is the canonical reason phrase of `status`.
pub fn status_response(status: StatusCode) -> Response {
    let mut response = text(status, status.canonical_reason().unwrap_or_default());
    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// The generic `404 Not Found` response.
pub fn not_found() -> Response {
    status_response(StatusCode::NOT_FOUND)
}

/// The generic `500 Internal Server Error` response.
pub fn internal_server_error() -> Response {
    status_response(StatusCode::INTERNAL_SERVER_ERROR)
}
