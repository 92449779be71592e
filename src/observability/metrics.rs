//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_redirects_total` (counter): redirects issued, by reason
//! - `gateway_requests_total` (counter): forwarded requests, by method and status
//! - `gateway_request_duration_seconds` (histogram): upstream round-trip latency
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Prometheus exposition runs on its own listener, off the request path

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::redirect::RedirectReason;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_redirect(reason: RedirectReason) {
    counter!("gateway_redirects_total", "reason" => reason.as_str()).increment(1);
}

pub fn record_request(method: &str, status: u16, start_time: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(start_time.elapsed().as_secs_f64());
}
