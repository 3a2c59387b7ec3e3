//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign request ID)
//!     → service.rs (buffer body, hand off to the routing core)
//!     → routing::Handler (dispatch on a blocking thread)
//!     → Send response to client
//! ```

pub mod request;
pub mod server;
pub mod service;

pub use request::{request_id, X_REQUEST_ID};
pub use server::HttpServer;
pub use service::RouterService;
