//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Both entry points (socket server, event envelope) produce:
//!     → logging.rs (structured log events inside a per-request span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all log lines via the dispatch span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
