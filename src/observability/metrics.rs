//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `domain_negotiations_total` (counter): negotiations by match type
//! - `domain_negotiation_failures_total` (counter): no domain available
//! - `domain_redirects_total` (counter): redirects by status
//! - `domain_redirects_rejected_total` (counter): untrusted targets

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::negotiation::MatchType;

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!("gateway_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_negotiation(match_type: MatchType) {
    counter!("domain_negotiations_total", "match_type" => match_type.as_str()).increment(1);
}

pub fn record_negotiation_failure() {
    counter!("domain_negotiation_failures_total").increment(1);
}

pub fn record_redirect(status: u16) {
    counter!("domain_redirects_total", "status" => status.to_string()).increment(1);
}

pub fn record_rejection() {
    counter!("domain_redirects_rejected_total").increment(1);
}
