//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging/metrics → Build router → Freeze → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → broadcast → server stops accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Routes are registered before the listener binds; traffic only when ready
//! - Shutdown drains in-flight requests (axum graceful shutdown)

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
