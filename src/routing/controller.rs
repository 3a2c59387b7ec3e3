//! Controller-based handler construction.
//!
//! A controller declares which roles it plays through [`Controller::roles`];
//! [`Handler::from_controller`] registers exactly those roles. Anything not
//! declared behaves as if it were never implemented: missing actions answer
//! not-found, missing error responders fall back to the generic responses,
//! and a missing resolver accepts every identifier.

use std::sync::Arc;

use tower::BoxError;

use super::context::Context;
use super::handler::Handler;
use super::request::{self, Request, Response};
use super::resolver::Resolution;

/// A role a controller can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Resource resolution for `/{id}`.
    Resolve,
    /// `GET /`
    List,
    /// `POST /`
    Create,
    /// `GET /{id}`
    Show,
    /// `PUT /{id}`, `PATCH /{id}`
    Update,
    /// `DELETE /{id}`
    Delete,
    NotFound,
    InternalServerError,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Resolve,
        Role::List,
        Role::Create,
        Role::Show,
        Role::Update,
        Role::Delete,
        Role::NotFound,
        Role::InternalServerError,
    ];
}

/// A resource controller.
///
/// Only the methods for roles listed in [`Controller::roles`] are ever
/// called by the handler.
pub trait Controller: Send + Sync + 'static {
    fn roles(&self) -> &[Role];

    fn resolve(&self, ctx: Context, _resource_id: &str) -> Result<Resolution, BoxError> {
        Ok(Resolution::Found(ctx))
    }

    fn list(&self, _request: Request) -> Response {
        request::not_found()
    }

    fn create(&self, _request: Request) -> Response {
        request::not_found()
    }

    fn show(&self, _request: Request) -> Response {
        request::not_found()
    }

    fn update(&self, _request: Request) -> Response {
        request::not_found()
    }

    fn delete(&self, _request: Request) -> Response {
        request::not_found()
    }

    fn not_found(&self, _request: Request) -> Response {
        request::not_found()
    }

    fn internal_server_error(&self, _request: Request) -> Response {
        request::internal_server_error()
    }
}

impl Handler {
    /// Build a handler from the roles `controller` declares.
    pub fn from_controller<C: Controller>(controller: Arc<C>) -> Self {
        let mut handler = Handler::new();
        for role in controller.roles() {
            let c = Arc::clone(&controller);
            handler = match role {
                Role::Resolve => handler.resolver(move |ctx: Context, id: &str| c.resolve(ctx, id)),
                Role::List => handler.list(move |req: Request| c.list(req)),
                Role::Create => handler.create(move |req: Request| c.create(req)),
                Role::Show => handler.show(move |req: Request| c.show(req)),
                Role::Update => handler.update(move |req: Request| c.update(req)),
                Role::Delete => handler.delete(move |req: Request| c.delete(req)),
                Role::NotFound => handler.on_not_found(move |req: Request| c.not_found(req)),
                Role::InternalServerError => {
                    handler.on_internal_server_error(move |req: Request| c.internal_server_error(req))
                }
            };
        }
        tracing::trace!(handler = ?handler, "Built handler from controller");
        handler
    }
}
