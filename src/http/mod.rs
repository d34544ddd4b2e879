//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout)
//!     → adapter.rs (wire request → ProxyRequest)
//!     → event::handle_event → routing::Router::dispatch
//!     → adapter.rs (ProxyResponse → wire response)
//!     → Send to client
//! ```
//!
//! `request.rs` and `response.rs` hold the structured model shared with the
//! event envelope path.

pub mod adapter;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use adapter::{canonical_header_key, from_structured_response, to_structured_request};
pub use request::{InvocationSource, ProxyRequest, RequestContext, X_REQUEST_ID};
pub use response::ProxyResponse;
pub use server::{GatewayServer, GatewayState};
