//! Error types for firewall-core

use thiserror::Error;

use crate::Protocol;

/// A transaction rule the chain policy rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("too few signatures: got {got}, need at least {min}")]
    TooFewSignatures { got: usize, min: usize },

    #[error("signature format error: length {0}, expected 64 or 65 bytes")]
    BadSignatureFormat(usize),

    #[error("gas limit {got} is below the minimum {min}")]
    GasTooLow { got: u64, min: u64 },

    #[error("fee too low: requires at least one of {required}")]
    FeeTooLow { required: String },

    #[error("memo length {len} exceeds the limit {max}")]
    MemoTooLong { len: usize, max: usize },

    #[error("illegal tx body field: {0}")]
    IllegalExtensionOptions(&'static str),

    #[error("transaction contains no messages")]
    EmptyMessages,

    #[error("unsupported message type {0:?}")]
    UnsupportedMessageType(String),

    #[error("illegal fee field: {0}")]
    IllegalGranterOrPayer(&'static str),

    #[error("too few signer infos: got {got}, need at least {min}")]
    TooFewSignerInfos { got: usize, min: usize },

    #[error("bad public key: {0}")]
    BadPublicKey(String),

    #[error("bad signature mode: {0}")]
    BadSignatureMode(String),

    #[error("broadcast mode is unspecified")]
    UnspecifiedBroadcastMode,
}

impl PolicyViolation {
    /// Stable label for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            PolicyViolation::TooFewSignatures { .. } => "too_few_signatures",
            PolicyViolation::BadSignatureFormat(_) => "bad_signature_format",
            PolicyViolation::GasTooLow { .. } => "gas_too_low",
            PolicyViolation::FeeTooLow { .. } => "fee_too_low",
            PolicyViolation::MemoTooLong { .. } => "memo_too_long",
            PolicyViolation::IllegalExtensionOptions(_) => "illegal_extension_options",
            PolicyViolation::EmptyMessages => "empty_messages",
            PolicyViolation::UnsupportedMessageType(_) => "unsupported_message_type",
            PolicyViolation::IllegalGranterOrPayer(_) => "illegal_granter_or_payer",
            PolicyViolation::TooFewSignerInfos { .. } => "too_few_signer_infos",
            PolicyViolation::BadPublicKey(_) => "bad_public_key",
            PolicyViolation::BadSignatureMode(_) => "bad_signature_mode",
            PolicyViolation::UnspecifiedBroadcastMode => "unspecified_broadcast_mode",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Policy(#[from] PolicyViolation),

    #[error("{protocol} route not allowed: {path}")]
    RouteDenied { protocol: Protocol, path: String },

    #[error("unknown application {app_id:?}, expected one of: {known}")]
    UnknownApplication { app_id: String, known: String },

    #[error("invalid route template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("invalid config: {0}")]
    Config(String),
}

impl Error {
    /// Short label for metrics: the policy rule name, or the error class
    pub fn reason(&self) -> &'static str {
        match self {
            Error::Policy(violation) => violation.reason(),
            Error::Decode(_) => "decode_error",
            Error::InvalidParams(_) => "invalid_params",
            Error::RouteDenied { .. } => "route_denied",
            Error::Json(_) => "parse_error",
            _ => "internal",
        }
    }
}

impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::Decode(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Decode(format!("invalid base64: {e}"))
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Decode(format!("invalid hex: {e}"))
    }
}
