//! Mounting child actions under a path prefix.
//!
//! A mounted action is registered twice on the parent multiplexer: once for
//! the exact prefix and once for the subtree below it. Either way the child
//! receives paths relative to its mount point.

use thiserror::Error;

use super::action::{boxed, Action, BoxAction};
use super::handler::Handler;
use super::mux::Multiplexer;
use super::request::{self, Request, Response};

/// Construction-time mount failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("mount name {0:?} must not contain \"/\"")]
    InvalidName(String),
}

/// Action wrapper that removes a path prefix before delegating.
///
/// Requests whose path does not start with the prefix get the generic 404.
pub struct StripPrefix {
    prefix: String,
    inner: BoxAction,
}

impl StripPrefix {
    pub fn new(prefix: impl Into<String>, inner: BoxAction) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }
}

impl Action for StripPrefix {
    fn call(&self, request: Request) -> Response {
        let Some(rest) = request.path().strip_prefix(self.prefix.as_str()) else {
            return request::not_found();
        };
        let rest = rest.to_string();
        self.inner.call(request.with_path(rest))
    }
}

/// Register `action` on `multiplexer` for `pattern` and everything below it.
///
/// The pattern gets a leading `/` when it lacks one and loses a trailing
/// `/`; e.g. `books/` registers `/books` and `/books/`.
pub fn mount<M>(multiplexer: &mut M, pattern: &str, action: BoxAction)
where
    M: Multiplexer + ?Sized,
{
    let pattern = format!("/{}", pattern.strip_prefix('/').unwrap_or(pattern));
    let pattern = pattern.strip_suffix('/').unwrap_or(&pattern);

    let stripped = boxed(StripPrefix::new(pattern, action));
    multiplexer.handle(pattern, stripped.clone());
    multiplexer.handle(&format!("{pattern}/"), stripped);
}

impl Handler {
    /// Mount `child` under `/{name}` below this handler's resource segment,
    /// so `/{id}/{name}/...` is served by `child` with `/...` as its path.
    pub fn mount(&mut self, name: &str, child: impl Action + 'static) -> Result<(), MountError> {
        if name.contains('/') {
            return Err(MountError::InvalidName(name.to_string()));
        }
        mount(self, &format!("/{name}"), boxed(child));
        tracing::debug!(name = %name, "Mounted child handler");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::context::ContextKey;
    use crate::routing::mux::Mux;
    use crate::routing::request::{not_found, text};
    use crate::routing::resolver::IdResolver;
    use axum::http::{Method, StatusCode};

    const BOOK_ID: ContextKey<String> = ContextKey::new("book_id");

    fn books() -> Handler {
        Handler::new()
            .resolver(IdResolver::new(BOOK_ID))
            .list(|_req: Request| text(StatusCode::OK, "books"))
            .show(|req: Request| {
                let id = req.value(&BOOK_ID).cloned().unwrap_or_default();
                text(StatusCode::OK, format!("show:{id}:{}", req.path()))
            })
    }

    fn body(res: Response) -> String {
        String::from_utf8(res.body().to_vec()).unwrap()
    }

    #[test]
    fn test_mount_pattern_normalization() {
        for pattern in ["/path0", "path1/", "/path2/", "path3"] {
            let mut mux = Mux::new();
            mount(&mut mux, pattern, boxed(books()));

            let name = pattern.trim_matches('/');
            let res = mux.serve(Request::new(Method::GET, format!("/{name}/123")), |_| not_found());
            assert_eq!(body(res), "show:123:/", "pattern {pattern}");

            let res = mux.serve(Request::new(Method::GET, format!("/{name}")), |_| not_found());
            assert_eq!(body(res), "books", "pattern {pattern}");
        }
    }

    #[test]
    fn test_strip_prefix_miss() {
        let action = StripPrefix::new("/books", boxed(books()));
        let res = action.call(Request::new(Method::GET, "/authors/1"));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_mount_rejects_separator_in_name() {
        let mut parent = Handler::new();
        let err = parent.mount("books/extra", books()).unwrap_err();
        assert_eq!(err, MountError::InvalidName("books/extra".to_string()));
        assert!(parent.routes().is_empty());
    }

    #[test]
    fn test_mount_registers_prefix() {
        let mut parent = Handler::new();
        parent.mount("books", books()).unwrap();
        assert!(parent.routes().has_prefix("/books"));
        assert!(!parent.routes().has_root());
        assert!(parent.routes().lookup("/books").is_some());
        assert!(parent.routes().lookup("/books/7").is_some());
    }

    #[test]
    fn test_mounted_child_sees_relative_paths() {
        let mut parent = Handler::new();
        parent.mount("books", books()).unwrap();

        let res = parent.serve(Request::new(Method::GET, "/7/books/42"));
        assert_eq!(body(res), "show:42:/");

        let res = parent.serve(Request::new(Method::GET, "/7/books"));
        assert_eq!(body(res), "books");

        let res = parent.serve(Request::new(Method::GET, "/7/books/"));
        assert_eq!(body(res), "books");
    }
}
