//! In-memory library used by the demo binary.

use std::sync::Arc;

use axum::http::StatusCode;
use rest_mount::routing::request::{self, json};
use rest_mount::routing::{
    boxed, mount, BoxAction, Context, ContextKey, Controller, Handler, MountError, Mux, Request,
    Resolution, Response, Role,
};
use serde::Serialize;
use serde_json::json as value;
use tower::BoxError;

const AUTHOR: ContextKey<Author> = ContextKey::new("author");
const BOOK: ContextKey<Book> = ContextKey::new("book");

#[derive(Debug, Clone, Serialize)]
struct Author {
    id: u32,
    name: String,
}

#[derive(Debug, Clone, Serialize)]
struct Book {
    id: u32,
    author_id: u32,
    title: String,
}

struct Library {
    authors: Vec<Author>,
    books: Vec<Book>,
}

impl Library {
    fn sample() -> Self {
        let author = |id: u32, name: &str| Author {
            id,
            name: name.to_string(),
        };
        let book = |id: u32, author_id: u32, title: &str| Book {
            id,
            author_id,
            title: title.to_string(),
        };
        Self {
            authors: vec![author(1, "Ursula K. Le Guin"), author(2, "Stanislaw Lem")],
            books: vec![
                book(1, 1, "The Dispossessed"),
                book(2, 1, "The Left Hand of Darkness"),
                book(3, 2, "Solaris"),
                book(4, 2, "The Cyberiad"),
            ],
        }
    }
}

fn missing(_request: Request) -> Response {
    json(StatusCode::NOT_FOUND, &value!({ "error": "not found" }))
}

struct Authors(Arc<Library>);

impl Controller for Authors {
    fn roles(&self) -> &[Role] {
        &[Role::Resolve, Role::List, Role::Show, Role::NotFound]
    }

    fn resolve(&self, ctx: Context, resource_id: &str) -> Result<Resolution, BoxError> {
        let Ok(id) = resource_id.parse::<u32>() else {
            return Ok(Resolution::NotFound);
        };
        Ok(match self.0.authors.iter().find(|a| a.id == id) {
            Some(author) => Resolution::Found(ctx.with_value(&AUTHOR, author.clone())),
            None => Resolution::NotFound,
        })
    }

    fn list(&self, _request: Request) -> Response {
        json(StatusCode::OK, &self.0.authors)
    }

    fn show(&self, request: Request) -> Response {
        match request.value(&AUTHOR) {
            Some(author) => json(StatusCode::OK, author),
            None => request::internal_server_error(),
        }
    }

    fn not_found(&self, request: Request) -> Response {
        missing(request)
    }
}

struct Books(Arc<Library>);

impl Controller for Books {
    fn roles(&self) -> &[Role] {
        &[Role::Resolve, Role::List, Role::Show, Role::NotFound]
    }

    fn resolve(&self, ctx: Context, resource_id: &str) -> Result<Resolution, BoxError> {
        let author_id = ctx
            .get(&AUTHOR)
            .map(|a| a.id)
            .ok_or("books resolved outside of an author")?;
        let Ok(id) = resource_id.parse::<u32>() else {
            return Ok(Resolution::NotFound);
        };
        let found = self
            .0
            .books
            .iter()
            .find(|b| b.id == id && b.author_id == author_id);
        Ok(match found {
            Some(book) => Resolution::Found(ctx.with_value(&BOOK, book.clone())),
            None => Resolution::NotFound,
        })
    }

    fn list(&self, request: Request) -> Response {
        let Some(author) = request.value(&AUTHOR) else {
            return request::internal_server_error();
        };
        let books: Vec<_> = self
            .0
            .books
            .iter()
            .filter(|b| b.author_id == author.id)
            .collect();
        json(StatusCode::OK, &books)
    }

    fn show(&self, request: Request) -> Response {
        match request.value(&BOOK) {
            Some(book) => json(StatusCode::OK, book),
            None => request::internal_server_error(),
        }
    }

    fn not_found(&self, request: Request) -> Response {
        missing(request)
    }
}

/// `/authors/{id}/books/{id}` over the sample library.
pub fn routes() -> Result<BoxAction, MountError> {
    let library = Arc::new(Library::sample());

    let mut authors = Handler::from_controller(Arc::new(Authors(Arc::clone(&library))));
    authors.mount("books", Handler::from_controller(Arc::new(Books(library))))?;

    let mut root = Mux::new();
    root.handle(
        "/",
        boxed(|req: Request| match req.path() {
            "/" => json(StatusCode::OK, &value!({ "resources": ["/authors"] })),
            _ => missing(req),
        }),
    );
    mount(&mut root, "authors", boxed(authors));
    Ok(boxed(root))
}
