//! Cosmos SDK REST gateway endpoint

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Instant;
use tracing::debug;

use firewall_core::constants::{REST_BROADCAST, REST_SIMULATE};
use firewall_core::payload::decode_broadcast_json;
use firewall_core::{PolicyValidator, Protocol};

use super::{finish, read_body, record_failure};
use crate::error::{Result, ServerError};
use crate::metrics::{OUTCOME_FORWARDED, OUTCOME_LOCAL};
use crate::state::SharedState;

pub async fn handle(State(state): State<SharedState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let uri = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
    debug!(method = %parts.method, uri = %uri, "rest request");

    let result: Result<Response> = async {
        state.validator.check_route(Protocol::Rest, &uri)?;
        let body = read_body(body).await?;
        inspect(&state.validator, &parts.method, parts.uri.path(), &body)?;

        if !state.forwarder.enabled() {
            finish(Protocol::Rest, start, OUTCOME_LOCAL);
            let body = json!({ "code": 200, "msg": "SUCCESS", "data": null });
            return Ok((StatusCode::OK, Json(body)).into_response());
        }

        let response = state.forwarder.unary_forward(Protocol::Rest, &parts, body).await?;
        finish(Protocol::Rest, start, OUTCOME_FORWARDED);
        Ok(response)
    }
    .await;

    result.unwrap_or_else(|e: ServerError| {
        let outcome = record_failure(Protocol::Rest, &uri, &e);
        finish(Protocol::Rest, start, outcome);
        e.into_response()
    })
}

/// Payload checks for the two transaction endpoints
///
/// Only POST bodies are inspected: a GET on the broadcast path is the tx
/// search query and carries no transaction.
fn inspect(validator: &PolicyValidator, method: &Method, path: &str, body: &[u8]) -> Result<()> {
    if method != Method::POST {
        return Ok(());
    }
    if path.eq_ignore_ascii_case(REST_SIMULATE) {
        validator.check_simulate(body)?;
    } else if path.eq_ignore_ascii_case(REST_BROADCAST) {
        let payload = decode_broadcast_json(body)?;
        validator.check_broadcast(&payload, false)?;
    }
    Ok(())
}
