//! Tendermint JSON-RPC endpoint
//!
//! Accepts POST bodies holding one request or a batch, and URI-style GET
//! calls such as `/broadcast_tx_sync?tx=0x...`. The URL path must be an
//! allowed route; so must every `method` named in a body. Transactions in
//! `broadcast_tx_*` and `check_tx` calls are checked against the chain policy.

use axum::extract::{Query, Request, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::request::Parts;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

use firewall_core::payload::{is_tx_method, json_rpc_tx_param, parse_json_rpc_body, uri_tx_param};
use firewall_core::{Error as CoreError, PolicyValidator, Protocol};

use super::{finish, read_body, record_failure};
use crate::error::ServerError;
use crate::metrics::{OUTCOME_FORWARDED, OUTCOME_LOCAL};
use crate::state::SharedState;

/// A failed check and the id of the request it belongs to
#[derive(Debug)]
struct Rejection {
    id: Value,
    error: ServerError,
}

impl Rejection {
    fn new(id: &Value, error: impl Into<ServerError>) -> Self {
        Self {
            id: id.clone(),
            error: error.into(),
        }
    }
}

pub async fn handle(State(state): State<SharedState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();
    debug!(method = %parts.method, path = %path, "json-rpc request");

    let body = match read_body(body).await {
        Ok(body) => body,
        Err(e) => return reject(start, &path, Rejection::new(&Value::Null, e)),
    };

    let id = match inspect(&state.validator, &parts, &body) {
        Ok(id) => id,
        Err(rejection) => return reject(start, &path, rejection),
    };

    if !state.forwarder.enabled() {
        finish(Protocol::JsonRpc, start, OUTCOME_LOCAL);
        return Json(json!({ "jsonrpc": "2.0", "id": id, "result": "SUCCESS" })).into_response();
    }

    match state.forwarder.unary_forward(Protocol::JsonRpc, &parts, body).await {
        Ok(response) => {
            finish(Protocol::JsonRpc, start, OUTCOME_FORWARDED);
            response
        }
        Err(e) => reject(start, &path, Rejection::new(&id, e)),
    }
}

/// Validate a request; returns the id used for a locally generated reply
///
/// A tx method path carries its transaction in the `tx` query parameter,
/// which the node reads whatever the body holds, so it is always checked.
/// Notifications (no id) are neither checked nor answered by the node, so
/// they are skipped here too.
fn inspect(validator: &PolicyValidator, parts: &Parts, body: &[u8]) -> Result<Value, Rejection> {
    let path = parts.uri.path();
    let deny = |e: CoreError| Rejection::new(&Value::Null, e);
    validator.check_route(Protocol::JsonRpc, path).map_err(deny)?;

    if is_tx_method(path) {
        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| deny(CoreError::InvalidParams(e.body_text())))?;
        let tx = match query.get("tx") {
            Some(value) => uri_tx_param(value).map_err(deny)?,
            None => Vec::new(),
        };
        validator.check_tx_bytes(&tx).map_err(deny)?;
    }

    if body.is_empty() {
        return Ok(json!(0));
    }

    let (requests, batch) = parse_json_rpc_body(body).map_err(deny)?;
    debug!(count = requests.len(), batch, "json-rpc body parsed");

    let mut first_id = None;
    for request in requests.iter().filter(|r| !r.is_notification()) {
        let fail = |e: CoreError| Rejection::new(&request.id, e);
        first_id.get_or_insert_with(|| request.id.clone());

        let method = request.method.trim_start_matches('/');
        if method.is_empty() {
            return Err(fail(CoreError::InvalidParams("empty method name".into())));
        }
        validator
            .check_route(Protocol::JsonRpc, &format!("/{method}"))
            .map_err(fail)?;

        if request.carries_tx() {
            let tx = json_rpc_tx_param(&request.params).map_err(fail)?;
            validator.check_tx_bytes(&tx).map_err(fail)?;
        }
    }
    Ok(first_id.unwrap_or_else(|| json!(0)))
}

fn reject(start: Instant, path: &str, rejection: Rejection) -> Response {
    let Rejection { id, error } = rejection;
    let outcome = record_failure(Protocol::JsonRpc, path, &error);
    finish(Protocol::JsonRpc, start, outcome);

    let body = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.json_rpc_code(),
            "message": error.to_string(),
            "data": error.reason(),
        }
    });
    (error.status_code(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_core::{ChainPolicy, RouteRegistry};
    use std::sync::Arc;

    fn validator() -> PolicyValidator {
        let routes = RouteRegistry::for_app("cosmoshub").unwrap();
        PolicyValidator::new(ChainPolicy::default(), Arc::new(routes))
    }

    fn parts(uri: &str) -> Parts {
        http::Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    fn code(result: Result<Value, Rejection>) -> i64 {
        result.err().map(|r| r.error.json_rpc_code()).unwrap_or(0)
    }

    #[test]
    fn test_unknown_path_is_method_not_found() {
        let v = validator();
        assert_eq!(code(inspect(&v, &parts("/unsafe_flush_mempool"), b"")), -32601);
        assert_eq!(inspect(&v, &parts("/status"), b"").unwrap(), json!(0));
    }

    #[test]
    fn test_body_methods_are_checked() {
        let v = validator();
        let body = br#"{"jsonrpc":"2.0","id":7,"method":"status","params":{}}"#;
        assert_eq!(inspect(&v, &parts("/"), body).unwrap(), json!(7));

        let body = br#"[{"jsonrpc":"2.0","id":1,"method":"status"},{"jsonrpc":"2.0","id":2,"method":"dial_peers"}]"#;
        let rejection = inspect(&v, &parts("/"), body).err().unwrap();
        assert_eq!(rejection.id, json!(2));
        assert_eq!(rejection.error.json_rpc_code(), -32601);
    }

    #[test]
    fn test_notifications_are_skipped() {
        let v = validator();
        let body = br#"[{"jsonrpc":"2.0","method":"dial_peers"},{"jsonrpc":"2.0","id":"a","method":"health"}]"#;
        assert_eq!(inspect(&v, &parts("/"), body).unwrap(), json!("a"));
    }

    #[test]
    fn test_transactions_are_checked() {
        let v = validator();
        // not a TxRaw
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"broadcast_tx_sync","params":{"tx":"AAEC"}}"#;
        assert_eq!(code(inspect(&v, &parts("/"), body)), -32602);

        let body = br#"{"jsonrpc":"2.0","id":1,"method":"broadcast_tx_sync","params":{}}"#;
        assert!(inspect(&v, &parts("/"), body).is_err());

        assert!(inspect(&v, &parts("/broadcast_tx_sync?tx=0x0001"), b"").is_err());
        assert!(inspect(&v, &parts("/broadcast_tx_sync"), b"").is_err());
    }

    #[test]
    fn test_query_tx_checked_even_with_a_body() {
        let v = validator();
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"status"}"#;
        let rejection = inspect(&v, &parts("/broadcast_tx_sync?tx=0x0001"), body).unwrap_err();
        assert_eq!(rejection.error.json_rpc_code(), -32602);

        // the tx path with no query tx is refused too
        assert!(inspect(&v, &parts("/broadcast_tx_async"), body).is_err());
    }

    #[test]
    fn test_empty_method_is_rejected() {
        let v = validator();
        let body = br#"{"jsonrpc":"2.0","id":3,"method":""}"#;
        let rejection = inspect(&v, &parts("/"), body).unwrap_err();
        assert_eq!(rejection.id, json!(3));
        assert_eq!(rejection.error.json_rpc_code(), -32602);

        let body = br#"{"jsonrpc":"2.0","id":4,"method":"/"}"#;
        assert!(inspect(&v, &parts("/"), body).is_err());
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let v = validator();
        assert_eq!(code(inspect(&v, &parts("/"), b"{not json")), -32700);
    }
}
