//! Relays allowed requests to the configured backend
//!
//! HTTP protocols (JSON-RPC, REST) are forwarded as one request/response
//! exchange with the body streamed back. gRPC calls are spliced frame by
//! frame onto an upstream stream, see [`crate::splice`].

use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use futures::Stream;
use http::header::{self, HeaderName};
use http::request::Parts;
use http::uri::PathAndQuery;
use std::sync::Arc;
use tokio::sync::watch;
use tonic::metadata::MetadataMap;
use tonic::transport::Channel;
use tonic::Status;
use tracing::{debug, warn};

use firewall_core::{ForwardConfig, ForwardMode, Protocol};

use crate::codec::Frame;
use crate::error::{Result, ServerError};
use crate::metrics;
use crate::node::{self, NodePools};
use crate::splice::{splice, InboundSink};

/// Connection-level headers that never cross the proxy
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

pub(crate) fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

enum Upstream {
    Local,
    Static { targets: ForwardConfig, grpc: Channel },
    Pool(Arc<NodePools>),
}

pub struct Forwarder {
    upstream: Upstream,
    http: reqwest::Client,
    shutdown: watch::Receiver<bool>,
}

impl Forwarder {
    /// Must be called within a tokio runtime when gRPC channels are created
    pub fn new(mode: &ForwardMode, shutdown: watch::Receiver<bool>) -> Result<Self> {
        // outbound traffic only goes through an explicitly configured proxy
        let mut builder = reqwest::Client::builder().no_proxy();
        let upstream = match mode {
            ForwardMode::Local => Upstream::Local,
            ForwardMode::Static(targets) => {
                builder = builder.timeout(targets.timeout());
                if let Some(proxy) = &targets.proxy {
                    let proxy = reqwest::Proxy::all(proxy)
                        .map_err(|e| ServerError::Internal(format!("invalid proxy {proxy}: {e}")))?;
                    builder = builder.proxy(proxy);
                }
                let grpc = node::grpc_channel(targets.target(Protocol::Grpc), targets.timeout())?;
                Upstream::Static {
                    targets: targets.clone(),
                    grpc,
                }
            }
            ForwardMode::Pool(config) => {
                builder = builder.timeout(config.timeout());
                Upstream::Pool(Arc::new(NodePools::new(config)?))
            }
        };
        let http = builder
            .build()
            .map_err(|e| ServerError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            upstream,
            http,
            shutdown,
        })
    }

    /// False when allowed requests are answered locally
    pub fn enabled(&self) -> bool {
        !matches!(self.upstream, Upstream::Local)
    }

    /// Node pools, when forwarding to a health-checked pool
    pub fn pools(&self) -> Option<Arc<NodePools>> {
        match &self.upstream {
            Upstream::Pool(pools) => Some(pools.clone()),
            _ => None,
        }
    }

    /// Base URI requests of `protocol` currently go to
    pub fn target_uri(&self, protocol: Protocol) -> Result<String> {
        match &self.upstream {
            Upstream::Local => Err(ServerError::NoBackend(protocol)),
            Upstream::Static { targets, .. } => {
                Ok(targets.target(protocol).trim_end_matches('/').to_string())
            }
            Upstream::Pool(pools) => pools
                .pool(protocol)
                .best()
                .map(|node| node.uri().to_string())
                .ok_or(ServerError::NoBackend(protocol)),
        }
    }

    fn grpc_channel(&self) -> Result<Channel> {
        match &self.upstream {
            Upstream::Local => Err(ServerError::NoBackend(Protocol::Grpc)),
            Upstream::Static { grpc, .. } => Ok(grpc.clone()),
            Upstream::Pool(pools) => pools
                .pool(Protocol::Grpc)
                .best()
                .and_then(|node| node.grpc_channel())
                .ok_or(ServerError::NoBackend(Protocol::Grpc)),
        }
    }

    /// Replay an HTTP request against the backend and stream its response back
    pub async fn unary_forward(&self, protocol: Protocol, parts: &Parts, body: Bytes) -> Result<Response> {
        let base = self.target_uri(protocol)?;
        let path = parts.uri.path_and_query().map_or("/", PathAndQuery::as_str);
        let url = format!("{base}{path}");
        debug!(%protocol, method = %parts.method, %url, "forwarding request");

        let mut request = self.http.request(parts.method.clone(), &url);
        for (name, value) in &parts.headers {
            if is_hop_by_hop(name) || name == header::HOST || name == header::CONTENT_LENGTH {
                continue;
            }
            request = request.header(name, value);
        }

        let upstream = match request.body(body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let err = ServerError::from(e);
                metrics::record_forward(protocol, err.reason());
                warn!(%protocol, %url, error = %err, "forward failed");
                return Err(err);
            }
        };
        metrics::record_forward(protocol, "ok");

        let mut response = Response::builder().status(upstream.status());
        for (name, value) in upstream.headers() {
            if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
                continue;
            }
            response = response.header(name, value);
        }
        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| ServerError::Internal(format!("failed to build response: {e}")))
    }

    /// Splice a gRPC call onto the current gRPC backend
    ///
    /// `first` is the request frame already read for inspection.
    pub async fn stream_forward<S, K>(
        &self,
        method: PathAndQuery,
        metadata: MetadataMap,
        first: Frame,
        inbound: S,
        sink: K,
    ) -> std::result::Result<(), Status>
    where
        S: Stream<Item = std::result::Result<Frame, Status>> + Send + 'static,
        K: InboundSink,
    {
        let channel = self.grpc_channel().map_err(|e| e.grpc_status())?;
        let result = splice(channel, method, metadata, first, inbound, sink, self.shutdown.clone()).await;
        let outcome = match &result {
            Ok(()) => "ok",
            Err(status) if status.code() == tonic::Code::DeadlineExceeded => "upstream_timeout",
            Err(_) => "upstream_error",
        };
        metrics::record_forward(Protocol::Grpc, outcome);
        result
    }
}
