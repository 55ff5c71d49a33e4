//! Prometheus metrics for the firewall
//!
//! Labels carry protocol, outcome and rule names only, never request content.

use firewall_core::{NodeTier, Protocol};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

pub const OUTCOME_LOCAL: &str = "local";
pub const OUTCOME_FORWARDED: &str = "forwarded";
pub const OUTCOME_DENIED: &str = "denied";
pub const OUTCOME_UPSTREAM_ERROR: &str = "upstream_error";

pub fn record_request(protocol: Protocol, outcome: &str, duration: Duration) {
    counter!("firewall_requests_total", "protocol" => protocol.as_str(), "outcome" => outcome.to_string())
        .increment(1);
    histogram!("firewall_request_duration_seconds", "protocol" => protocol.as_str())
        .record(duration.as_secs_f64());
}

pub fn record_denied(protocol: Protocol, reason: &'static str) {
    counter!("firewall_denied_total", "protocol" => protocol.as_str(), "reason" => reason).increment(1);
}

pub fn record_forward(protocol: Protocol, outcome: &str) {
    counter!("firewall_forward_total", "protocol" => protocol.as_str(), "outcome" => outcome.to_string())
        .increment(1);
}

pub fn set_node_height(protocol: Protocol, tier: NodeTier, node: &str, height: u64) {
    gauge!(
        "firewall_node_height",
        "protocol" => protocol.as_str(),
        "tier" => tier.as_str(),
        "node" => node.to_string()
    )
    .set(height as f64);
}

pub fn record_probe_failure(protocol: Protocol, tier: NodeTier) {
    counter!("firewall_node_probe_failures_total", "protocol" => protocol.as_str(), "tier" => tier.as_str())
        .increment(1);
}

pub fn record_promotion(protocol: Protocol, tier: NodeTier) {
    counter!("firewall_node_promotions_total", "protocol" => protocol.as_str(), "tier" => tier.as_str())
        .increment(1);
}

/// Install the global recorder and serve `/metrics` on `addr`
///
/// Must be called from within a tokio runtime.
pub fn install_prometheus_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}
