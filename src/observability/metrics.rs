//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): dispatches by method, source, outcome, status
//! - `router_request_duration_seconds` (histogram): dispatch latency by source, outcome
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; a no-op until a recorder is installed
//! - Prometheus exposition is opt-in via config

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::http::InvocationSource;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished dispatch.
pub fn record_dispatch(
    method: &str,
    source: InvocationSource,
    outcome: &'static str,
    status: u16,
    started_at: Instant,
) {
    ::metrics::counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "source" => source.as_str(),
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!(
        "router_request_duration_seconds",
        "source" => source.as_str(),
        "outcome" => outcome
    )
    .record(started_at.elapsed().as_secs_f64());
}
