//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stub_requests_total` (counter): requests by method, outcome, status
//! - `stub_request_duration_seconds` (histogram): time to produce the
//!   response head, by outcome
//!
//! # Design Decisions
//! - Recording is always on; without an installed exporter the calls are no-ops
//! - Outcome is the dispatch branch name, or `unmatched`

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Serve Prometheus metrics on `addr`. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, outcome: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "stub_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("stub_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
