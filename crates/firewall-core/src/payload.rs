//! Transaction payloads as they arrive on each protocol
//!
//! Simulate and broadcast requests look the same whether they come in over
//! REST or gRPC, so decoding and checking is shared here. JSON-RPC carries
//! the raw transaction in a `tx` parameter.

use base64::{engine::general_purpose, Engine as _};
use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::JSON_RPC_TX_METHODS;
use crate::proto::{BroadcastMode, BroadcastTxRequest, SimulateRequest, Tx};
use crate::{Error, PolicyValidator, PolicyViolation, Result};

/// What a simulate request asks the node to run
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatePayload {
    /// Deprecated inline transaction
    Tx(Tx),
    /// Signed `TxRaw` bytes
    TxBytes(Vec<u8>),
}

/// A broadcast request
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastPayload {
    pub tx_bytes: Vec<u8>,
    pub mode: BroadcastMode,
}

/// JSON shape shared by simulate and broadcast on the HTTP gateway
#[derive(Debug, Default, Deserialize)]
struct TxBytesJson {
    #[serde(default)]
    tx_bytes: Option<String>,
    #[serde(default)]
    mode: Option<Value>,
}

impl TxBytesJson {
    fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::Decode(format!("invalid request body: {e}")))
    }

    fn tx_bytes(&self) -> Result<Vec<u8>> {
        match self.tx_bytes.as_deref() {
            Some(encoded) if !encoded.is_empty() => Ok(general_purpose::STANDARD.decode(encoded)?),
            _ => Ok(Vec::new()),
        }
    }

    fn mode(&self) -> Result<BroadcastMode> {
        match &self.mode {
            None | Some(Value::Null) => Ok(BroadcastMode::Unspecified),
            Some(Value::String(name)) => BroadcastMode::from_name(name)
                .ok_or_else(|| Error::InvalidParams(format!("unknown broadcast mode {name:?}"))),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .and_then(|n| BroadcastMode::try_from(n).ok())
                .ok_or_else(|| Error::InvalidParams(format!("unknown broadcast mode {n}"))),
            Some(other) => Err(Error::InvalidParams(format!("invalid broadcast mode {other}"))),
        }
    }
}

/// Decode a simulate request: protobuf first, then the JSON gateway shape
pub fn decode_simulate(body: &[u8]) -> Result<SimulatePayload> {
    if let Ok(req) = SimulateRequest::decode(body) {
        if !req.tx_bytes.is_empty() {
            return Ok(SimulatePayload::TxBytes(req.tx_bytes));
        }
        if let Some(tx) = req.tx {
            return Ok(SimulatePayload::Tx(tx));
        }
    }

    let json = TxBytesJson::parse(body)?;
    let tx_bytes = json.tx_bytes()?;
    if tx_bytes.is_empty() {
        return Err(Error::Decode("simulate request carries no transaction".into()));
    }
    Ok(SimulatePayload::TxBytes(tx_bytes))
}

/// Decode a protobuf `BroadcastTxRequest` (gRPC)
pub fn decode_broadcast_proto(body: &[u8]) -> Result<BroadcastPayload> {
    let req = BroadcastTxRequest::decode(body)?;
    let mode = BroadcastMode::try_from(req.mode)
        .map_err(|_| Error::InvalidParams(format!("unknown broadcast mode {}", req.mode)))?;
    Ok(BroadcastPayload {
        tx_bytes: req.tx_bytes,
        mode,
    })
}

/// Decode the REST gateway JSON body `{"tx_bytes": "<base64>", "mode": ...}`
///
/// `mode` may be the enum name or its number.
pub fn decode_broadcast_json(body: &[u8]) -> Result<BroadcastPayload> {
    let json = TxBytesJson::parse(body)?;
    Ok(BroadcastPayload {
        tx_bytes: json.tx_bytes()?,
        mode: json.mode()?,
    })
}

impl PolicyValidator {
    /// Decode and check a simulate request body
    pub fn check_simulate(&self, body: &[u8]) -> Result<()> {
        match decode_simulate(body)? {
            SimulatePayload::TxBytes(raw) => self.check_tx_bytes(&raw),
            SimulatePayload::Tx(tx) => self.check_tx(&tx),
        }
    }

    /// Check a decoded broadcast request
    ///
    /// `require_mode` rejects `BROADCAST_MODE_UNSPECIFIED`, which the gRPC
    /// service refuses while the HTTP gateway tolerates it.
    pub fn check_broadcast(&self, payload: &BroadcastPayload, require_mode: bool) -> Result<()> {
        if require_mode && payload.mode == BroadcastMode::Unspecified {
            return Err(PolicyViolation::UnspecifiedBroadcastMode.into());
        }
        if payload.tx_bytes.is_empty() {
            return Err(Error::Decode("invalid empty tx bytes".into()));
        }
        self.check_tx_bytes(&payload.tx_bytes)
    }
}

/// One JSON-RPC 2.0 request object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Requests without an id are notifications
    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }

    /// True if the method carries a transaction to inspect
    pub fn carries_tx(&self) -> bool {
        is_tx_method(&self.method)
    }
}

/// True for `broadcast_tx_*` and `check_tx`
pub fn is_tx_method(method: &str) -> bool {
    let method = method.trim_start_matches('/');
    JSON_RPC_TX_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method))
}

/// Parse a JSON-RPC body: a single request or a batch
///
/// Returns the requests and whether the body was a batch.
pub fn parse_json_rpc_body(body: &[u8]) -> Result<(Vec<JsonRpcRequest>, bool)> {
    let value: Value = serde_json::from_slice(body)?;
    match value {
        Value::Array(items) => {
            let requests = items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<std::result::Result<Vec<JsonRpcRequest>, _>>()?;
            Ok((requests, true))
        }
        single @ Value::Object(_) => Ok((vec![serde_json::from_value(single)?], false)),
        other => Err(Error::InvalidParams(format!(
            "expected a request object or array, got {other}"
        ))),
    }
}

/// Extract the raw transaction from JSON-RPC params
///
/// Accepts `{"tx": "<base64>"}` or `["<base64>"]`. A missing `tx` yields an
/// empty transaction, which the policy then rejects.
pub fn json_rpc_tx_param(params: &Value) -> Result<Vec<u8>> {
    let tx = match params {
        Value::Object(map) => map.get("tx"),
        Value::Array(items) => items.first(),
        Value::Null => None,
        other => {
            return Err(Error::InvalidParams(format!(
                "params must be an object or array, got {other}"
            )))
        }
    };
    match tx {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(encoded)) => Ok(general_purpose::STANDARD.decode(encoded)?),
        Some(other) => Err(Error::InvalidParams(format!(
            "tx must be a base64 string, got {other}"
        ))),
    }
}

/// Decode a `tx` URI argument: `0x`-prefixed hex or (optionally quoted) base64
pub fn uri_tx_param(value: &str) -> Result<Vec<u8>> {
    if let Some(hex_str) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        return Ok(hex::decode(hex_str)?);
    }
    let unquoted = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Ok(general_purpose::STANDARD.decode(unquoted)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::tests::{validator, TxParts};
    use serde_json::json;

    fn b64(bytes: &[u8]) -> String {
        general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_simulate_proto_tx_bytes() {
        let raw = TxParts::valid().encode();
        let body = SimulateRequest {
            tx: None,
            tx_bytes: raw.clone(),
        }
        .encode_to_vec();
        assert_eq!(decode_simulate(&body).unwrap(), SimulatePayload::TxBytes(raw));
        validator().check_simulate(&body).unwrap();
    }

    #[test]
    fn test_simulate_proto_inline_tx() {
        let parts = TxParts::valid();
        let body = SimulateRequest {
            tx: Some(Tx {
                body: Some(parts.body),
                auth_info: Some(parts.auth_info),
                signatures: parts.signatures,
            }),
            tx_bytes: vec![],
        }
        .encode_to_vec();
        assert!(matches!(decode_simulate(&body).unwrap(), SimulatePayload::Tx(_)));
        validator().check_simulate(&body).unwrap();
    }

    #[test]
    fn test_simulate_json_fallback() {
        let raw = TxParts::valid().encode();
        let body = json!({ "tx_bytes": b64(&raw) }).to_string();
        assert_eq!(
            decode_simulate(body.as_bytes()).unwrap(),
            SimulatePayload::TxBytes(raw)
        );
    }

    #[test]
    fn test_simulate_without_tx_rejected() {
        assert!(matches!(decode_simulate(b"{}"), Err(Error::Decode(_))));
        assert!(matches!(decode_simulate(b""), Err(Error::Decode(_))));
    }

    #[test]
    fn test_broadcast_json_modes() {
        let raw = TxParts::valid().encode();
        let by_name = json!({ "tx_bytes": b64(&raw), "mode": "BROADCAST_MODE_SYNC" }).to_string();
        let by_number = json!({ "tx_bytes": b64(&raw), "mode": 3 }).to_string();
        let without = json!({ "tx_bytes": b64(&raw) }).to_string();

        assert_eq!(decode_broadcast_json(by_name.as_bytes()).unwrap().mode, BroadcastMode::Sync);
        assert_eq!(decode_broadcast_json(by_number.as_bytes()).unwrap().mode, BroadcastMode::Async);
        assert_eq!(
            decode_broadcast_json(without.as_bytes()).unwrap().mode,
            BroadcastMode::Unspecified
        );
        assert!(decode_broadcast_json(br#"{"tx_bytes":"","mode":"FAST"}"#).is_err());
    }

    #[test]
    fn test_broadcast_mode_requirement() {
        let payload = BroadcastPayload {
            tx_bytes: TxParts::valid().encode(),
            mode: BroadcastMode::Unspecified,
        };
        validator().check_broadcast(&payload, false).unwrap();
        assert!(matches!(
            validator().check_broadcast(&payload, true),
            Err(Error::Policy(PolicyViolation::UnspecifiedBroadcastMode))
        ));

        let empty = BroadcastPayload {
            tx_bytes: vec![],
            mode: BroadcastMode::Sync,
        };
        assert!(matches!(validator().check_broadcast(&empty, true), Err(Error::Decode(_))));
    }

    #[test]
    fn test_broadcast_proto() {
        let raw = TxParts::valid().encode();
        let body = BroadcastTxRequest {
            tx_bytes: raw.clone(),
            mode: BroadcastMode::Block as i32,
        }
        .encode_to_vec();
        let payload = decode_broadcast_proto(&body).unwrap();
        assert_eq!(payload.tx_bytes, raw);
        assert_eq!(payload.mode, BroadcastMode::Block);
    }

    #[test]
    fn test_json_rpc_body_shapes() {
        let (single, batch) =
            parse_json_rpc_body(br#"{"jsonrpc":"2.0","id":1,"method":"status"}"#).unwrap();
        assert!(!batch);
        assert_eq!(single[0].method, "status");
        assert!(!single[0].is_notification());

        let (many, batch) = parse_json_rpc_body(
            br#"[{"jsonrpc":"2.0","id":"a","method":"health"},{"jsonrpc":"2.0","method":"status"}]"#,
        )
        .unwrap();
        assert!(batch);
        assert_eq!(many.len(), 2);
        assert!(many[1].is_notification());

        assert!(parse_json_rpc_body(b"not json").is_err());
        assert!(parse_json_rpc_body(b"42").is_err());
    }

    #[test]
    fn test_tx_param_shapes() {
        let raw = vec![1u8, 2, 3];
        assert_eq!(json_rpc_tx_param(&json!({ "tx": b64(&raw) })).unwrap(), raw);
        assert_eq!(json_rpc_tx_param(&json!([b64(&raw)])).unwrap(), raw);
        assert!(json_rpc_tx_param(&json!({})).unwrap().is_empty());
        assert!(json_rpc_tx_param(&json!([])).unwrap().is_empty());
        assert!(json_rpc_tx_param(&json!({ "tx": 5 })).is_err());
        assert!(json_rpc_tx_param(&json!("tx")).is_err());
        assert!(matches!(
            json_rpc_tx_param(&json!({ "tx": "%%%" })),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_uri_tx_param() {
        assert_eq!(uri_tx_param("0x0102").unwrap(), vec![1, 2]);
        assert_eq!(uri_tx_param("\"AQI=\"").unwrap(), vec![1, 2]);
        assert_eq!(uri_tx_param("AQI=").unwrap(), vec![1, 2]);
        assert!(uri_tx_param("0xZZ").is_err());
    }

    #[test]
    fn test_tx_methods() {
        assert!(is_tx_method("broadcast_tx_sync"));
        assert!(is_tx_method("/broadcast_tx_commit"));
        assert!(is_tx_method("CHECK_TX"));
        assert!(!is_tx_method("status"));
    }
}
