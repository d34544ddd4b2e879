//! Event Router Library
//!
//! A path-trie request router with an ordered middleware pipeline, served
//! either from a local HTTP socket or from structured JSON event envelopes.

pub mod config;
pub mod deps;
pub mod event;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use deps::HandlerDependencies;
pub use http::{GatewayServer, ProxyRequest, ProxyResponse, RequestContext};
pub use lifecycle::Shutdown;
pub use routing::{Handler, HandlerError, Middleware, Params, Router};
