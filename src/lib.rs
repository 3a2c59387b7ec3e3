//! Convention-based RESTful resource routing.
//!
//! Maps the five resource actions onto paths and methods:
//!
//! | Path          | Method        | Action |
//! |---------------|---------------|--------|
//! | `/`           | GET           | List   |
//! | `/`           | POST          | Create |
//! | `/{id}`       | GET           | Show   |
//! | `/{id}`       | PUT, PATCH    | Update |
//! | `/{id}`       | DELETE        | Delete |
//! | `/{id}/...`   | any           | custom patterns and mounted children |
//!
//! Child handlers mounted under a name receive paths relative to their mount
//! point, so resources nest to any depth.

// Routing core
pub mod routing;

// Serving
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Controller, Handler, MountError, Request, Response};
