//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_forwards_total` (counter): requests handed to a backend, by service
//! - `gateway_rejections_total` (counter): terminal pipeline failures, by kind
//!
//! # Design Decisions
//! - Prometheus exporter runs its own listener, off the gateway port
//! - `service` is `none` for requests answered before routing

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("service", service.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_forward(service: &str) {
    counter!("gateway_forwards_total", "service" => service.to_string()).increment(1);
}

pub fn record_rejection(kind: &'static str) {
    counter!("gateway_rejections_total", "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_request("GET", 200, "analysis", Instant::now());
        record_forward("analysis");
        record_rejection("no_route_match");
    }
}
