//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (after routing, before the handler):
//!     → headers.rs (add hardening response headers)
//!     → limits.rs (reject oversized bodies with 413)
//!     → next middleware / terminal handler
//! ```
//!
//! # Design Decisions
//! - Both are plain router middleware, registered with `Router::use_middleware`
//! - Fail closed: a rejected request never reaches the handler

pub mod headers;
pub mod limits;

pub use headers::SecurityHeaders;
pub use limits::BodyLimit;
