//! The unary action contract.

use std::sync::Arc;

use super::request::{Request, Response};

/// Anything that turns a request into a response.
///
/// Implemented for plain closures, for [`Handler`](super::Handler) and for
/// the prefix-stripping wrapper used by mounts.
pub trait Action: Send + Sync {
    fn call(&self, request: Request) -> Response;
}

impl<F> Action for F
where
    F: Fn(Request) -> Response + Send + Sync,
{
    fn call(&self, request: Request) -> Response {
        self(request)
    }
}

/// Shared, type-erased action.
pub type BoxAction = Arc<dyn Action>;

/// Erase an action into a [`BoxAction`].
pub fn boxed<A>(action: A) -> BoxAction
where
    A: Action + 'static,
{
    Arc::new(action)
}
