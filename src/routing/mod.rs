//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound (method, path)
//!     → tree.rs (resolve path to node, capture params)
//!     → router.rs (pick route by method, or fallthrough / 405)
//!     → middleware.rs (global middleware, then route middleware)
//!     → handler.rs (terminal handler writes the response)
//!
//! Route Registration (at startup):
//!     Router::get/post/... + use_middleware
//!     → PathTree nodes created per segment
//!     → Router moved into an Arc, read-only from then on
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - Deterministic: static > named parameter > wildcard at every position
//! - Middleware halting is not an error; handler failures are

pub mod handler;
pub mod middleware;
pub mod params;
pub mod router;
pub mod tree;

pub use handler::{handler_fn, middleware_fn, Handler, HandlerError, Middleware, NotFound};
pub use middleware::run_middleware;
pub use params::Params;
pub use router::{Dispatch, DispatchError, Route, RouteHandle, Router};
pub use tree::{split_path, Node, PathTree, SegmentKind};
