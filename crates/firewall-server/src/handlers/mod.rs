//! Protocol adapters: parse framing, validate, then answer or forward

pub mod grpc;
pub mod jsonrpc;
pub mod rest;

use axum::body::{Body, Bytes};
use firewall_core::{Error as CoreError, Protocol};
use std::time::Instant;
use tracing::warn;

use crate::error::{Result, ServerError};
use crate::metrics;

/// Largest HTTP request body read for inspection
pub const MAX_BODY_LEN: usize = 4 * 1024 * 1024;

pub(crate) async fn read_body(body: Body) -> Result<Bytes> {
    axum::body::to_bytes(body, MAX_BODY_LEN)
        .await
        .map_err(|e| CoreError::InvalidParams(format!("failed to read request body: {e}")).into())
}

/// Count and log a refused or failed request; returns the outcome label
pub(crate) fn record_failure(protocol: Protocol, path: &str, err: &ServerError) -> &'static str {
    if err.is_denial() {
        metrics::record_denied(protocol, err.reason());
        warn!(%protocol, path, reason = err.reason(), error = %err, "request denied");
        metrics::OUTCOME_DENIED
    } else {
        warn!(%protocol, path, error = %err, "request failed");
        metrics::OUTCOME_UPSTREAM_ERROR
    }
}

pub(crate) fn finish(protocol: Protocol, start: Instant, outcome: &str) {
    metrics::record_request(protocol, outcome, start.elapsed());
}
