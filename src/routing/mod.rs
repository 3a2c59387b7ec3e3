//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, body, context)
//!     → handler.rs (dispatch decision tree, panic boundary)
//!     → path.rs (unshift the resource id)
//!     → resolver.rs (resolve id, enrich context)
//!     → table.rs (collection / resource action lookup)
//!       or mux.rs (custom patterns, mounted child handlers)
//!     → Response
//!
//! Construction (at startup):
//!     controller.rs / builder methods
//!     → mount.rs (child handlers under /{id}/{name})
//!     → Freeze as Arc<Handler>
//! ```
//!
//! # Design Decisions
//! - Handlers are immutable once served; registration happens up front
//! - Synchronous core: blocking belongs to actions and resolvers
//! - One response per request; faults never escape a handler

pub mod action;
pub mod context;
pub mod controller;
pub mod handler;
pub mod mount;
pub mod mux;
pub mod path;
pub mod request;
pub mod resolver;
pub mod table;

pub use action::{boxed, Action, BoxAction};
pub use context::{Context, ContextKey};
pub use controller::{Controller, Role};
pub use handler::{Handler, Outcome};
pub use mount::{mount, MountError, StripPrefix};
pub use mux::{Multiplexer, Mux};
pub use path::{canonical_path, unshift, unshift_request};
pub use request::{Request, Response};
pub use resolver::{IdResolver, Resolution, ResourceResolver};
pub use table::OperationTable;
