//! Metrics collection and exposition.
//!
//! # Metrics
//! - `messages_published_total` (counter): publishes by exchange
//! - `messages_consumed_total` (counter): acknowledged pulls by queue
//! - `event_log_failures_total` (counter): log records the broker refused
//! - `event_log_dropped_total` (counter): log records dropped before publishing
//! - `broker_operation_duration_seconds` (histogram): broker round trips by operation
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_published(exchange: &str) {
    counter!("messages_published_total", "exchange" => exchange.to_string()).increment(1);
}

pub fn record_consumed(queue: &str) {
    counter!("messages_consumed_total", "queue" => queue.to_string()).increment(1);
}

pub fn record_event_log_failure() {
    counter!("event_log_failures_total").increment(1);
}

pub fn record_event_log_dropped() {
    counter!("event_log_dropped_total").increment(1);
}

pub fn record_broker_operation(operation: &'static str, start: Instant) {
    histogram!("broker_operation_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}
