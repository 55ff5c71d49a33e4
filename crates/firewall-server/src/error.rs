//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use firewall_core::{Error as CoreError, Protocol};
use serde_json::json;
use thiserror::Error;

use crate::framing::FrameError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Firewall(#[from] CoreError),

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("no {0} backend available")]
    NoBackend(Protocol),

    #[error("node {uri} is catching up")]
    NodeCatchingUp { uri: String },

    #[error("node {uri} unreachable: {reason}")]
    NodeUnreachable { uri: String, reason: String },

    #[error("invalid gRPC frame: {0}")]
    Frame(#[from] FrameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Firewall(e) => match e {
                CoreError::RouteDenied { .. } => StatusCode::METHOD_NOT_ALLOWED,
                CoreError::Decode(_) | CoreError::InvalidParams(_) | CoreError::Json(_) => {
                    StatusCode::BAD_REQUEST
                }
                CoreError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::UpstreamUnreachable(_)
            | ServerError::Upstream(_)
            | ServerError::NoBackend(_) => StatusCode::BAD_GATEWAY,
            ServerError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Frame(_) => StatusCode::BAD_REQUEST,
            ServerError::NodeCatchingUp { .. }
            | ServerError::NodeUnreachable { .. }
            | ServerError::Io(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON-RPC 2.0 error code
    pub fn json_rpc_code(&self) -> i64 {
        match self {
            ServerError::Firewall(e) => match e {
                CoreError::Json(_) => -32700,
                CoreError::RouteDenied { .. } => -32601,
                CoreError::Decode(_) | CoreError::InvalidParams(_) => -32602,
                CoreError::Policy(_) => -32001,
                _ => -32603,
            },
            ServerError::UpstreamUnreachable(_)
            | ServerError::UpstreamTimeout(_)
            | ServerError::Upstream(_)
            | ServerError::NoBackend(_) => -32002,
            ServerError::Frame(_) => -32602,
            _ => -32603,
        }
    }

    pub fn grpc_status(&self) -> tonic::Status {
        let message = self.to_string();
        match self {
            ServerError::Firewall(e) => match e {
                CoreError::RouteDenied { .. } => tonic::Status::permission_denied(message),
                CoreError::Decode(_) | CoreError::InvalidParams(_) | CoreError::Json(_) => {
                    tonic::Status::invalid_argument(message)
                }
                CoreError::Policy(_) => tonic::Status::failed_precondition(message),
                _ => tonic::Status::internal(message),
            },
            ServerError::Frame(FrameError::Compressed) => tonic::Status::unimplemented(message),
            ServerError::Frame(_) => tonic::Status::invalid_argument(message),
            ServerError::UpstreamUnreachable(_)
            | ServerError::Upstream(_)
            | ServerError::NoBackend(_) => tonic::Status::unavailable(message),
            ServerError::UpstreamTimeout(_) => tonic::Status::deadline_exceeded(message),
            _ => tonic::Status::internal(message),
        }
    }

    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            ServerError::Firewall(e) => e.reason(),
            ServerError::UpstreamUnreachable(_) | ServerError::NoBackend(_) => "upstream_unreachable",
            ServerError::UpstreamTimeout(_) => "upstream_timeout",
            ServerError::Upstream(_) => "upstream_error",
            ServerError::Frame(_) => "bad_frame",
            _ => "internal",
        }
    }

    /// True for validation failures, as opposed to forwarding or internal errors
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            ServerError::Frame(_)
                | ServerError::Firewall(
                    CoreError::RouteDenied { .. }
                        | CoreError::Decode(_)
                        | CoreError::InvalidParams(_)
                        | CoreError::Json(_)
                        | CoreError::Policy(_)
                )
        )
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServerError::UpstreamTimeout(e.to_string())
        } else if e.is_connect() {
            ServerError::UpstreamUnreachable(e.to_string())
        } else {
            ServerError::Upstream(e.to_string())
        }
    }
}

impl From<firewall_core::PolicyViolation> for ServerError {
    fn from(v: firewall_core::PolicyViolation) -> Self {
        ServerError::Firewall(CoreError::Policy(v))
    }
}

/// REST gateway error envelope: `{"code", "msg", "data"}`
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "code": status.as_u16(),
            "msg": self.to_string(),
            "data": null,
        });
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_core::PolicyViolation;

    #[test]
    fn test_denials_map_per_protocol() {
        let denied = ServerError::from(CoreError::RouteDenied {
            protocol: Protocol::Rest,
            path: "/admin".into(),
        });
        assert_eq!(denied.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(denied.json_rpc_code(), -32601);
        assert_eq!(denied.grpc_status().code(), tonic::Code::PermissionDenied);
        assert!(denied.is_denial());

        let policy = ServerError::from(PolicyViolation::EmptyMessages);
        assert_eq!(policy.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(policy.json_rpc_code(), -32001);
        assert_eq!(policy.grpc_status().code(), tonic::Code::FailedPrecondition);
        assert_eq!(policy.reason(), "empty_messages");
        assert!(policy.to_string().contains("no messages"));
    }

    #[test]
    fn test_upstream_failures_are_distinguishable() {
        for err in [
            ServerError::UpstreamUnreachable("connection refused".into()),
            ServerError::Upstream("reset".into()),
            ServerError::NoBackend(Protocol::Grpc),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
            assert_eq!(err.json_rpc_code(), -32002);
            assert_eq!(err.grpc_status().code(), tonic::Code::Unavailable);
            assert!(!err.is_denial());
        }
        let timeout = ServerError::UpstreamTimeout("30s".into());
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.grpc_status().code(), tonic::Code::DeadlineExceeded);
    }

    #[test]
    fn test_frame_errors() {
        let short = ServerError::from(FrameError::TooShort(4));
        assert_eq!(short.grpc_status().code(), tonic::Code::InvalidArgument);
        let compressed = ServerError::from(FrameError::Compressed);
        assert_eq!(compressed.grpc_status().code(), tonic::Code::Unimplemented);
    }
}
