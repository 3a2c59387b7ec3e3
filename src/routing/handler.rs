//! Request dispatcher.
//!
//! # Decision Tree
//! ```text
//! path is root
//!     → collection table hit          → action
//!     → sub-router has `/`            → sub-router
//!     → otherwise                     → not found
//! path is /{id}/rest
//!     → resolver(id) errors           → internal error
//!     → resolver(id) misses           → not found
//!     → rest starts with a known sub-router prefix → sub-router
//!     → resource table hit            → action
//!     → sub-router has `/`            → sub-router
//!     → otherwise                     → not found
//! ```
//!
//! # Design Decisions
//! - Immutable after construction, shared behind `Arc` while serving
//! - All per-request data lives in the derived request and its context
//! - Every dispatch runs inside a panic boundary; the configured internal
//!   error responder gets a single attempt, its own failure yields the
//!   generic 500

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::Method;
use tower::BoxError;

use super::action::{boxed, Action, BoxAction};
use super::context::Context;
use super::mux::{Multiplexer, Mux};
use super::path::{is_root, unshift_request};
use super::request::{self, Request, Response};
use super::resolver::{Resolution, ResourceResolver};
use super::table::OperationTable;
use crate::observability::metrics;

/// Terminal branch taken by a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Collection,
    Resource,
    SubRouter,
    NotFound,
    InternalError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Collection => "collection",
            Outcome::Resource => "resource",
            Outcome::SubRouter => "sub_router",
            Outcome::NotFound => "not_found",
            Outcome::InternalError => "internal_error",
        }
    }
}

/// A RESTful resource router.
///
/// Serves `List`/`Create` at its own root, resolves `/{id}` through its
/// [`ResourceResolver`] and serves `Show`/`Update`/`Delete` on the resolved
/// resource, and delegates deeper paths to custom patterns and mounted
/// child handlers.
#[derive(Default)]
pub struct Handler {
    resolver: Option<Arc<dyn ResourceResolver>>,
    collection: OperationTable,
    resource: OperationTable,
    not_found: Option<BoxAction>,
    internal_server_error: Option<BoxAction>,
    routes: Mux,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// `GET /`
    pub fn list(mut self, action: impl Action + 'static) -> Self {
        self.collection.set(Method::GET, boxed(action));
        self
    }

    /// `POST /`
    pub fn create(mut self, action: impl Action + 'static) -> Self {
        self.collection.set(Method::POST, boxed(action));
        self
    }

    /// `GET /{id}`
    pub fn show(mut self, action: impl Action + 'static) -> Self {
        self.resource.set(Method::GET, boxed(action));
        self
    }

    /// `PUT /{id}` and `PATCH /{id}`
    pub fn update(mut self, action: impl Action + 'static) -> Self {
        let action = boxed(action);
        self.resource.set(Method::PUT, Arc::clone(&action));
        self.resource.set(Method::PATCH, action);
        self
    }

    /// `DELETE /{id}`
    pub fn delete(mut self, action: impl Action + 'static) -> Self {
        self.resource.set(Method::DELETE, boxed(action));
        self
    }

    pub fn resolver(mut self, resolver: impl ResourceResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Responder used instead of the generic 404.
    pub fn on_not_found(mut self, action: impl Action + 'static) -> Self {
        self.not_found = Some(boxed(action));
        self
    }

    /// Responder used instead of the generic 500.
    pub fn on_internal_server_error(mut self, action: impl Action + 'static) -> Self {
        self.internal_server_error = Some(boxed(action));
        self
    }

    /// Builder form of [`Handler::handle`].
    pub fn route(mut self, pattern: &str, action: impl Action + 'static) -> Self {
        self.handle(pattern, boxed(action));
        self
    }

    /// Register a custom pattern on the sub-router.
    ///
    /// `/` acts as a catch-all used when no standard action matches.
    pub fn handle(&mut self, pattern: &str, action: BoxAction) {
        self.routes.handle(pattern, action);
    }

    pub fn collection(&self) -> &OperationTable {
        &self.collection
    }

    pub fn resource(&self) -> &OperationTable {
        &self.resource
    }

    pub fn routes(&self) -> &Mux {
        &self.routes
    }

    /// Serve a request. Never panics: faults are answered with a 500.
    pub fn serve(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.path().to_string();
        let retained = request.clone();

        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(request))) {
            Ok((outcome, response)) => {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    outcome = outcome.as_str(),
                    status = response.status().as_u16(),
                    "Dispatched request"
                );
                metrics::record_dispatch(outcome.as_str());
                response
            }
            Err(cause) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    panic = %panic_message(cause.as_ref()),
                    "Request handling panicked"
                );
                metrics::record_dispatch("panic");
                self.respond_internal_server_error(retained)
            }
        }
    }

    fn dispatch(&self, request: Request) -> (Outcome, Response) {
        if is_root(request.path()) {
            if let Some(action) = self.collection.lookup(request.method()) {
                return (Outcome::Collection, action.call(request));
            }
            return self.fallback(request);
        }

        let (request, resource_id) = unshift_request(request);
        match self.resolve(request.context().clone(), &resource_id) {
            Err(e) => {
                tracing::warn!(resource_id = %resource_id, error = %e, "Resource resolution failed");
                (Outcome::InternalError, self.respond_internal_server_error(request))
            }
            Ok(Resolution::NotFound) => {
                tracing::debug!(resource_id = %resource_id, "Resource not found");
                (Outcome::NotFound, self.respond_not_found(request))
            }
            Ok(Resolution::Found(ctx)) => {
                let request = request.with_context(ctx);

                if self.routes.has_prefix(request.path()) {
                    return self.serve_routes(request);
                }
                if let Some(action) = self.resource.lookup(request.method()) {
                    return (Outcome::Resource, action.call(request));
                }
                self.fallback(request)
            }
        }
    }

    fn fallback(&self, request: Request) -> (Outcome, Response) {
        if self.routes.has_root() {
            self.serve_routes(request)
        } else {
            (Outcome::NotFound, self.respond_not_found(request))
        }
    }

    fn resolve(&self, ctx: Context, resource_id: &str) -> Result<Resolution, BoxError> {
        match &self.resolver {
            Some(resolver) => resolver.resolve(ctx, resource_id),
            None => Ok(Resolution::Found(ctx)),
        }
    }

    /// A pattern miss inside the sub-router counts as not found.
    fn serve_routes(&self, request: Request) -> (Outcome, Response) {
        let mut outcome = Outcome::SubRouter;
        let response = self.routes.serve(request, |request| {
            outcome = Outcome::NotFound;
            self.respond_not_found(request)
        });
        (outcome, response)
    }

    fn respond_not_found(&self, request: Request) -> Response {
        match &self.not_found {
            Some(action) => action.call(request),
            None => request::not_found(),
        }
    }

    fn respond_internal_server_error(&self, request: Request) -> Response {
        let Some(action) = &self.internal_server_error else {
            return request::internal_server_error();
        };

        match panic::catch_unwind(AssertUnwindSafe(|| action.call(request))) {
            Ok(response) => response,
            Err(cause) => {
                tracing::error!(
                    panic = %panic_message(cause.as_ref()),
                    "Internal server error responder panicked"
                );
                request::internal_server_error()
            }
        }
    }
}

impl Action for Handler {
    fn call(&self, request: Request) -> Response {
        self.serve(request)
    }
}

impl Multiplexer for Handler {
    fn handle(&mut self, pattern: &str, action: BoxAction) {
        Handler::handle(self, pattern, action);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("has_resolver", &self.resolver.is_some())
            .field("collection", &self.collection)
            .field("resource", &self.resource)
            .field("has_not_found", &self.not_found.is_some())
            .field("has_internal_server_error", &self.internal_server_error.is_some())
            .field("routes", &self.routes)
            .finish()
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(message) = cause.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::context::ContextKey;
    use crate::routing::request::text;
    use crate::routing::resolver::IdResolver;
    use axum::http::StatusCode;

    const ID: ContextKey<String> = ContextKey::new("id");

    fn reply(body: &'static str) -> impl Action + 'static {
        move |_req: Request| text(StatusCode::OK, body)
    }

    fn call(handler: &Handler, method: Method, path: &str) -> (StatusCode, String) {
        let res = handler.serve(Request::new(method, path));
        let body = String::from_utf8(res.body().to_vec()).unwrap();
        (res.status(), body)
    }

    fn crud() -> Handler {
        Handler::new()
            .list(reply("list"))
            .create(reply("create"))
            .show(reply("show"))
            .update(reply("update"))
            .delete(reply("delete"))
    }

    #[test]
    fn test_standard_actions() {
        let handler = crud();
        assert_eq!(call(&handler, Method::GET, "/").1, "list");
        assert_eq!(call(&handler, Method::GET, "").1, "list");
        assert_eq!(call(&handler, Method::POST, "/").1, "create");
        assert_eq!(call(&handler, Method::GET, "/1").1, "show");
        assert_eq!(call(&handler, Method::PUT, "/1").1, "update");
        assert_eq!(call(&handler, Method::PATCH, "/1").1, "update");
        assert_eq!(call(&handler, Method::DELETE, "/1").1, "delete");
    }

    #[test]
    fn test_unsupported_method_is_not_found() {
        let handler = crud();
        assert_eq!(call(&handler, Method::DELETE, "/").0, StatusCode::NOT_FOUND);
        assert_eq!(call(&handler, Method::POST, "/1").0, StatusCode::NOT_FOUND);
        assert_eq!(call(&handler, Method::OPTIONS, "/1").0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_root_without_collection_actions() {
        let handler = Handler::new().show(reply("show"));
        let (status, body) = call(&handler, Method::GET, "/");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[test]
    fn test_resource_action_sees_remainder_and_context() {
        let handler = Handler::new()
            .resolver(IdResolver::new(ID))
            .show(|req: Request| {
                let id = req.value(&ID).cloned().unwrap_or_default();
                text(StatusCode::OK, format!("{id}:{}", req.path()))
            });
        assert_eq!(call(&handler, Method::GET, "/42").1, "42:/");
    }

    #[test]
    fn test_resolver_miss_is_not_found_for_every_method() {
        let handler = crud().resolver(|_ctx: Context, _id: &str| -> Result<Resolution, BoxError> {
            Ok(Resolution::NotFound)
        });
        for method in [Method::GET, Method::PUT, Method::PATCH, Method::DELETE] {
            assert_eq!(call(&handler, method, "/1").0, StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_resolver_error_is_internal_server_error() {
        let handler = crud()
            .resolver(|_ctx: Context, _id: &str| -> Result<Resolution, BoxError> {
                Err("database unavailable".into())
            })
            .on_not_found(reply("custom not found"));
        let (status, body) = call(&handler, Method::GET, "/1");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
    }

    #[test]
    fn test_custom_responders() {
        let handler = Handler::new()
            .resolver(|_ctx: Context, id: &str| -> Result<Resolution, BoxError> {
                match id {
                    "err" => Err("boom".into()),
                    _ => Ok(Resolution::NotFound),
                }
            })
            .on_not_found(|_req: Request| text(StatusCode::NOT_FOUND, "no such thing"))
            .on_internal_server_error(|_req: Request| {
                text(StatusCode::INTERNAL_SERVER_ERROR, "we broke it")
            });

        assert_eq!(call(&handler, Method::GET, "/x").1, "no such thing");
        assert_eq!(call(&handler, Method::GET, "/err").1, "we broke it");
    }

    #[test]
    fn test_panicking_action_uses_error_responder_once() {
        let handler = Handler::new()
            .list(|_req: Request| -> Response { panic!("list exploded") })
            .on_internal_server_error(|req: Request| {
                text(StatusCode::INTERNAL_SERVER_ERROR, format!("handled {}", req.path()))
            });
        let (status, body) = call(&handler, Method::GET, "/");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "handled /");
    }

    #[test]
    fn test_panicking_error_responder_yields_generic_500() {
        let handler = Handler::new()
            .show(|_req: Request| -> Response { panic!("show exploded") })
            .on_internal_server_error(|_req: Request| -> Response { panic!("responder exploded") });
        let (status, body) = call(&handler, Method::GET, "/1");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
    }

    #[test]
    fn test_panicking_resolver_is_contained() {
        let handler = crud().resolver(|_ctx: Context, _id: &str| -> Result<Resolution, BoxError> {
            panic!("resolver exploded")
        });
        assert_eq!(call(&handler, Method::GET, "/1").0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_sub_router_prefix_preempts_resource_actions() {
        let handler = crud().route("/comments/", |req: Request| {
            text(StatusCode::OK, format!("comments:{}", req.path()))
        });
        assert_eq!(call(&handler, Method::GET, "/1/comments/2").1, "comments:/comments/2");
        assert_eq!(call(&handler, Method::GET, "/1").1, "show");
    }

    #[test]
    fn test_root_pattern_is_fallback_only() {
        let handler = Handler::new()
            .list(reply("list"))
            .show(reply("show"))
            .route("/", |req: Request| text(StatusCode::OK, format!("fallback:{}", req.path())));

        assert_eq!(call(&handler, Method::GET, "/").1, "list");
        assert_eq!(call(&handler, Method::POST, "/").1, "fallback:/");
        assert_eq!(call(&handler, Method::GET, "/1").1, "show");
        assert_eq!(call(&handler, Method::DELETE, "/1").1, "fallback:/");
        assert_eq!(call(&handler, Method::GET, "/1/unknown").1, "show");
    }

    #[test]
    fn test_panicking_not_found_responder_yields_500() {
        let handler = Handler::new()
            .show(reply("show"))
            .on_not_found(|_req: Request| -> Response { panic!("not found exploded") });

        for (method, path) in [(Method::GET, "/"), (Method::DELETE, "/1")] {
            let (status, body) = call(&handler, method, path);
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "Internal Server Error");
        }
    }

    #[test]
    fn test_sub_router_outcome_labels() {
        let outcome = |handler: &Handler, path: &str| {
            handler.dispatch(Request::new(Method::GET, path)).0
        };

        let handler = Handler::new().route("/comments", reply("comments"));
        assert_eq!(outcome(&handler, "/1/comments"), Outcome::SubRouter);
        assert_eq!(outcome(&handler, "/1/comments/9"), Outcome::NotFound);
        assert_eq!(outcome(&handler, "/1"), Outcome::NotFound);

        let handler = handler.route("/", reply("fallback"));
        assert_eq!(outcome(&handler, "/1"), Outcome::SubRouter);
    }

    #[test]
    fn test_sub_router_miss_uses_not_found_responder() {
        let handler = Handler::new()
            .route("/comments", reply("comments"))
            .on_not_found(reply("missing"));
        assert_eq!(call(&handler, Method::GET, "/1/comments").1, "comments");
        assert_eq!(call(&handler, Method::GET, "/1/comments/9").1, "missing");
    }

    #[test]
    fn test_only_separators_is_root() {
        let handler = crud();
        assert_eq!(call(&handler, Method::GET, "///").1, "list");
    }
}
