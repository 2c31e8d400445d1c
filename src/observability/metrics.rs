//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mesh_connections_accepted_total` (counter)
//! - `mesh_handshakes_total` (counter): by outcome
//! - `mesh_service_registered` (gauge): 1=registered, 0=not
//! - `mesh_in_flight_connections` (gauge)
//! - `mesh_requests_total` (counter): by method, status
//! - `mesh_request_duration_seconds` (histogram): by method
//! - `mesh_directory_errors_total` (counter): by operation
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connection_accepted() {
    counter!("mesh_connections_accepted_total").increment(1);
}

pub fn record_handshake(outcome: &'static str) {
    counter!("mesh_handshakes_total", "outcome" => outcome).increment(1);
}

pub fn record_registered(registered: bool) {
    gauge!("mesh_service_registered").set(if registered { 1.0 } else { 0.0 });
}

pub fn record_in_flight(count: usize) {
    gauge!("mesh_in_flight_connections").set(count as f64);
}

pub fn record_request(method: &str, ok: bool, start: Instant) {
    let status = if ok { "ok" } else { "error" };
    counter!("mesh_requests_total", "method" => method.to_string(), "status" => status)
        .increment(1);
    histogram!("mesh_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_directory_error(operation: &'static str) {
    counter!("mesh_directory_errors_total", "operation" => operation).increment(1);
}
