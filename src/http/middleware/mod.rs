//! Built-in router middleware.
//!
//! Security-related middleware lives in [`crate::security`].

pub mod access_log;

pub use access_log::AccessLog;
