//! Backend node pools with height-based failover
//!
//! Each protocol gets a [`NodePool`] with three tier lists. Index 0 of a tier
//! is the node requests go to. A periodic health check probes every node's
//! latest block height and swaps the most advanced reachable node to the
//! front. The swap replaces the whole list atomically, so readers see either
//! the old or the new order, never a partial one.

use arc_swap::ArcSwap;
use futures::future::join_all;
use http::uri::PathAndQuery;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tonic::client::Grpc;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info, warn};

use firewall_core::constants::{GRPC_GET_LATEST_BLOCK, REST_LATEST_BLOCK};
use firewall_core::proto::{GetLatestBlockRequest, GetLatestBlockResponse};
use firewall_core::{NodePoolConfig, NodeTier, Protocol, TierUris};

use crate::codec::{PassthroughCodec, Typed};
use crate::error::{Result, ServerError};
use crate::metrics;
use crate::splice::wait_for_shutdown;

/// Tendermint RPC `/status`
#[derive(Deserialize)]
struct StatusResponse {
    result: StatusResult,
}

#[derive(Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Deserialize)]
struct SyncInfo {
    latest_block_height: String,
    #[serde(default)]
    catching_up: bool,
}

/// REST `/cosmos/base/tendermint/v1beta1/blocks/latest`
#[derive(Deserialize)]
struct LatestBlockJson {
    #[serde(default)]
    block: Option<BlockJson>,
    #[serde(default)]
    sdk_block: Option<BlockJson>,
}

#[derive(Deserialize)]
struct BlockJson {
    header: HeaderJson,
}

#[derive(Deserialize)]
struct HeaderJson {
    height: String,
}

pub struct JsonRpcNode {
    uri: String,
    http: reqwest::Client,
}

pub struct RestNode {
    uri: String,
    http: reqwest::Client,
}

pub struct GrpcNode {
    uri: String,
    channel: Channel,
    timeout: Duration,
}

/// A backend endpoint and the client used to reach it
pub enum NodeHandle {
    JsonRpc(JsonRpcNode),
    Grpc(GrpcNode),
    Rest(RestNode),
}

impl NodeHandle {
    /// Build a handle; gRPC channels connect lazily, so this needs a tokio runtime
    pub fn new(protocol: Protocol, uri: &str, http: &reqwest::Client, timeout: Duration) -> Result<Self> {
        let uri = uri.trim_end_matches('/').to_string();
        Ok(match protocol {
            Protocol::JsonRpc => NodeHandle::JsonRpc(JsonRpcNode {
                uri,
                http: http.clone(),
            }),
            Protocol::Rest => NodeHandle::Rest(RestNode {
                uri,
                http: http.clone(),
            }),
            Protocol::Grpc => {
                let channel = grpc_channel(&uri, timeout)?;
                NodeHandle::Grpc(GrpcNode {
                    uri,
                    channel,
                    timeout,
                })
            }
        })
    }

    pub fn uri(&self) -> &str {
        match self {
            NodeHandle::JsonRpc(n) => &n.uri,
            NodeHandle::Grpc(n) => &n.uri,
            NodeHandle::Rest(n) => &n.uri,
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            NodeHandle::JsonRpc(_) => Protocol::JsonRpc,
            NodeHandle::Grpc(_) => Protocol::Grpc,
            NodeHandle::Rest(_) => Protocol::Rest,
        }
    }

    /// Channel of a gRPC node, shared with the forwarder
    pub fn grpc_channel(&self) -> Option<Channel> {
        match self {
            NodeHandle::Grpc(n) => Some(n.channel.clone()),
            _ => None,
        }
    }

    /// Latest block height as reported by the node
    pub async fn latest_height(&self) -> Result<u64> {
        match self {
            NodeHandle::JsonRpc(n) => n.latest_height().await,
            NodeHandle::Grpc(n) => n.latest_height().await,
            NodeHandle::Rest(n) => n.latest_height().await,
        }
    }
}

fn unreachable(uri: &str, reason: impl std::fmt::Display) -> ServerError {
    ServerError::NodeUnreachable {
        uri: uri.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_height(uri: &str, height: &str) -> Result<u64> {
    height
        .parse()
        .map_err(|_| unreachable(uri, format!("invalid height {height:?}")))
}

impl JsonRpcNode {
    async fn latest_height(&self) -> Result<u64> {
        let url = format!("{}/status", self.uri);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| unreachable(&self.uri, e))?;
        let status: StatusResponse = resp.json().await.map_err(|e| unreachable(&self.uri, e))?;
        if status.result.sync_info.catching_up {
            return Err(ServerError::NodeCatchingUp {
                uri: self.uri.clone(),
            });
        }
        parse_height(&self.uri, &status.result.sync_info.latest_block_height)
    }
}

impl RestNode {
    async fn latest_height(&self) -> Result<u64> {
        let url = format!("{}{}", self.uri, REST_LATEST_BLOCK);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| unreachable(&self.uri, e))?;
        let latest: LatestBlockJson = resp.json().await.map_err(|e| unreachable(&self.uri, e))?;
        let block = latest
            .sdk_block
            .or(latest.block)
            .ok_or_else(|| unreachable(&self.uri, "response has no block"))?;
        parse_height(&self.uri, &block.header.height)
    }
}

impl GrpcNode {
    async fn latest_height(&self) -> Result<u64> {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready().await.map_err(|e| unreachable(&self.uri, e))?;

        let mut request = tonic::Request::new(Typed(GetLatestBlockRequest {}));
        request.set_timeout(self.timeout);
        let codec = PassthroughCodec::<Typed<GetLatestBlockRequest>, Typed<GetLatestBlockResponse>>::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(GRPC_GET_LATEST_BLOCK), codec)
            .await
            .map_err(|status| unreachable(&self.uri, status.message()))?;

        let Typed(latest) = response.into_inner();
        let height = latest
            .height()
            .ok_or_else(|| unreachable(&self.uri, "response has no block header"))?;
        u64::try_from(height).map_err(|_| unreachable(&self.uri, format!("negative height {height}")))
    }
}

/// Lazily connected channel; TLS is used for `https` URIs
///
/// `timeout` bounds both connecting and waiting for each response's headers.
pub(crate) fn grpc_channel(uri: &str, timeout: Duration) -> Result<Channel> {
    let mut endpoint = Endpoint::from_shared(uri.to_string())
        .map_err(|e| unreachable(uri, format!("invalid URI: {e}")))?
        .connect_timeout(timeout)
        .timeout(timeout);
    if uri.starts_with("https://") {
        endpoint = endpoint
            .tls_config(ClientTlsConfig::new().with_native_roots())
            .map_err(|e| unreachable(uri, e))?;
    }
    Ok(endpoint.connect_lazy())
}

/// Tiered node lists for one protocol
pub struct NodePool {
    protocol: Protocol,
    tiers: [ArcSwap<Vec<Arc<NodeHandle>>>; 3],
    round: Mutex<()>,
}

impl NodePool {
    pub fn new(protocol: Protocol, uris: &TierUris, http: &reqwest::Client, timeout: Duration) -> Result<Self> {
        let mut tiers: [Vec<NodeHandle>; 3] = Default::default();
        for tier in NodeTier::ALL {
            for uri in uris.tier(tier) {
                tiers[tier.index()].push(NodeHandle::new(protocol, uri, http, timeout)?);
            }
        }
        Ok(Self::from_tiers(protocol, tiers))
    }

    /// Pool from prebuilt handles, indexed by [`NodeTier::index`]
    pub fn from_tiers(protocol: Protocol, tiers: [Vec<NodeHandle>; 3]) -> Self {
        Self {
            protocol,
            tiers: tiers.map(|nodes| ArcSwap::from_pointee(nodes.into_iter().map(Arc::new).collect())),
            round: Mutex::new(()),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Current order of a tier
    pub fn tier(&self, tier: NodeTier) -> Arc<Vec<Arc<NodeHandle>>> {
        self.tiers[tier.index()].load_full()
    }

    pub fn uris(&self, tier: NodeTier) -> Vec<String> {
        self.tier(tier).iter().map(|n| n.uri().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(|t| t.load().is_empty())
    }

    /// Head of the first non-empty tier, in [`NodeTier::PREFERENCE`] order
    pub fn best(&self) -> Option<Arc<NodeHandle>> {
        NodeTier::PREFERENCE
            .iter()
            .find_map(|tier| self.tiers[tier.index()].load().first().cloned())
    }

    /// Probe every node of every tier and promote each tier's highest node
    ///
    /// Rounds are serialized; tiers within a round are probed concurrently.
    pub async fn check_node(&self) {
        let _round = self.round.lock().await;
        join_all(NodeTier::ALL.iter().map(|tier| self.check_tier(*tier))).await;
    }

    async fn check_tier(&self, tier: NodeTier) {
        let nodes = self.tier(tier);
        if nodes.is_empty() {
            return;
        }

        let heights = join_all(nodes.iter().map(|node| node.latest_height())).await;

        let mut best: Option<(usize, u64)> = None;
        for (i, (node, result)) in nodes.iter().zip(heights).enumerate() {
            match result {
                Ok(height) => {
                    metrics::set_node_height(self.protocol, tier, node.uri(), height);
                    debug!(protocol = %self.protocol, %tier, node = node.uri(), height, "node height");
                    if best.map_or(true, |(_, h)| height > h) {
                        best = Some((i, height));
                    }
                }
                Err(e) => {
                    metrics::record_probe_failure(self.protocol, tier);
                    warn!(protocol = %self.protocol, %tier, node = node.uri(), error = %e, "node probe failed");
                }
            }
        }

        if let Some((i, height)) = best.filter(|(i, _)| *i != 0) {
            let mut reordered = Vec::clone(&nodes);
            reordered.swap(0, i);
            self.tiers[tier.index()].store(Arc::new(reordered));
            metrics::record_promotion(self.protocol, tier);
            info!(
                protocol = %self.protocol,
                %tier,
                node = nodes[i].uri(),
                height,
                "promoted node to head of tier"
            );
        }
    }
}

/// One pool per protocol plus the health-check schedule
pub struct NodePools {
    json_rpc: NodePool,
    grpc: NodePool,
    rest: NodePool,
    interval: Duration,
}

impl NodePools {
    pub fn new(config: &NodePoolConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServerError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            json_rpc: NodePool::new(Protocol::JsonRpc, &config.json_rpc, &http, config.timeout())?,
            grpc: NodePool::new(Protocol::Grpc, &config.grpc, &http, config.timeout())?,
            rest: NodePool::new(Protocol::Rest, &config.rest, &http, config.timeout())?,
            interval: config.check_interval(),
        })
    }

    pub fn from_pools(json_rpc: NodePool, grpc: NodePool, rest: NodePool, interval: Duration) -> Self {
        Self {
            json_rpc,
            grpc,
            rest,
            interval,
        }
    }

    pub fn pool(&self, protocol: Protocol) -> &NodePool {
        match protocol {
            Protocol::JsonRpc => &self.json_rpc,
            Protocol::Grpc => &self.grpc,
            Protocol::Rest => &self.rest,
        }
    }

    pub async fn check_node(&self) {
        tokio::join!(
            self.json_rpc.check_node(),
            self.grpc.check_node(),
            self.rest.check_node()
        );
    }

    /// Run health checks immediately and then every interval until shutdown
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "node health checks started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.check_node().await,
                _ = wait_for_shutdown(shutdown.clone()) => break,
            }
        }
        info!("node health checks stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    struct MockNode {
        uri: String,
        _shutdown: oneshot::Sender<()>,
    }

    async fn serve(router: Router) -> MockNode {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await
                .unwrap();
        });
        MockNode {
            uri: format!("http://{addr}"),
            _shutdown: tx,
        }
    }

    async fn rest_node(height: u64) -> MockNode {
        serve(Router::new().route(
            REST_LATEST_BLOCK,
            get(move || async move { Json(json!({ "block": { "header": { "height": height.to_string() } } })) }),
        ))
        .await
    }

    async fn json_rpc_node(height: u64, catching_up: bool) -> MockNode {
        serve(Router::new().route(
            "/status",
            get(move || async move {
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": -1,
                    "result": { "sync_info": {
                        "latest_block_height": height.to_string(),
                        "catching_up": catching_up,
                    } }
                }))
            }),
        ))
        .await
    }

    /// An address nothing listens on
    async fn dead_uri() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn http() -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    fn pool(protocol: Protocol, full: Vec<String>) -> NodePool {
        let uris = TierUris {
            full,
            ..Default::default()
        };
        NodePool::new(protocol, &uris, &http(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_reachable_node_replaces_dead_head() {
        let live = rest_node(100).await;
        let dead = dead_uri().await;
        let pool = pool(Protocol::Rest, vec![dead.clone(), live.uri.clone()]);

        pool.check_node().await;
        assert_eq!(pool.uris(NodeTier::Full), vec![live.uri.clone(), dead]);
        assert_eq!(pool.best().unwrap().uri(), live.uri);
    }

    #[tokio::test]
    async fn test_all_dead_keeps_order() {
        let a = dead_uri().await;
        let b = dead_uri().await;
        let pool = pool(Protocol::Rest, vec![a.clone(), b.clone()]);

        pool.check_node().await;
        assert_eq!(pool.uris(NodeTier::Full), vec![a, b]);
    }

    #[tokio::test]
    async fn test_highest_node_wins_and_ties_keep_head() {
        let low = rest_node(10).await;
        let high = rest_node(20).await;
        let also_high = rest_node(20).await;
        let pool = pool(
            Protocol::Rest,
            vec![low.uri.clone(), high.uri.clone(), also_high.uri.clone()],
        );

        pool.check_node().await;
        assert_eq!(
            pool.uris(NodeTier::Full),
            vec![high.uri.clone(), low.uri.clone(), also_high.uri.clone()]
        );

        // a second round with unchanged heights is a no-op
        pool.check_node().await;
        assert_eq!(pool.uris(NodeTier::Full)[0], high.uri);
    }

    #[tokio::test]
    async fn test_catching_up_node_is_not_promoted() {
        let syncing = json_rpc_node(500, true).await;
        let synced = json_rpc_node(400, false).await;
        let head = json_rpc_node(300, false).await;
        let pool = pool(
            Protocol::JsonRpc,
            vec![head.uri.clone(), syncing.uri.clone(), synced.uri.clone()],
        );

        let err = pool.tier(NodeTier::Full)[1].latest_height().await.unwrap_err();
        assert!(matches!(err, ServerError::NodeCatchingUp { .. }));

        pool.check_node().await;
        assert_eq!(pool.uris(NodeTier::Full)[0], synced.uri);
    }

    #[tokio::test]
    async fn test_best_follows_tier_preference() {
        let http = http();
        let timeout = Duration::from_secs(1);
        let handle = |uri: &str| NodeHandle::new(Protocol::Rest, uri, &http, timeout).unwrap();

        let pool = NodePool::from_tiers(
            Protocol::Rest,
            [vec![handle("http://light:1317")], vec![handle("http://full:1317")], vec![]],
        );
        assert_eq!(pool.best().unwrap().uri(), "http://light:1317");

        let pool = NodePool::from_tiers(
            Protocol::Rest,
            [vec![], vec![handle("http://full:1317")], vec![handle("http://archive:1317/")]],
        );
        assert_eq!(pool.best().unwrap().uri(), "http://archive:1317");

        let empty = NodePool::from_tiers(Protocol::Rest, [vec![], vec![], vec![]]);
        assert!(empty.is_empty());
        assert!(empty.best().is_none());
    }

    #[tokio::test]
    async fn test_grpc_handles_share_channel() {
        let handle = NodeHandle::new(
            Protocol::Grpc,
            "http://127.0.0.1:9090",
            &http(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(handle.protocol(), Protocol::Grpc);
        assert!(handle.grpc_channel().is_some());
        assert!(NodeHandle::new(Protocol::Grpc, "not a uri", &http(), Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_stalled_grpc_upstream_times_out() {
        let stalled = serve(Router::new().fallback(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            ""
        }))
        .await;
        let channel = grpc_channel(&stalled.uri, Duration::from_millis(200)).unwrap();

        let mut grpc = Grpc::new(channel);
        grpc.ready().await.unwrap();
        let call = grpc.unary(
            tonic::Request::new(crate::codec::Frame::default()),
            PathAndQuery::from_static("/cosmos.bank.v1beta1.Query/Balance"),
            PassthroughCodec::<crate::codec::Frame, crate::codec::Frame>::default(),
        );
        let result = tokio::time::timeout(Duration::from_secs(5), call)
            .await
            .expect("channel timeout should end the call first");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_loop_stops_on_shutdown() {
        let pools = Arc::new(NodePools::from_pools(
            NodePool::from_tiers(Protocol::JsonRpc, Default::default()),
            NodePool::from_tiers(Protocol::Grpc, Default::default()),
            NodePool::from_tiers(Protocol::Rest, Default::default()),
            Duration::from_millis(10),
        ));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(pools.run(rx));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
