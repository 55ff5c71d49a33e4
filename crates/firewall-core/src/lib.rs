//! firewall-core: routing and transaction policy for the Cosmos node firewall
//!
//! The firewall sits in front of a cluster of Cosmos SDK nodes and decides
//! ALLOW / DENY / FORWARD for every JSON-RPC, gRPC and REST request:
//!
//! - [`RouteRegistry`] holds the allow-lists a backend application actually serves
//! - [`PathPattern`] matches templated REST paths such as `/cosmos/bank/v1beta1/balances/{address}`
//! - [`PolicyValidator`] decodes transactions and enforces the [`ChainPolicy`] rule set
//!
//! Nothing in this crate touches the network; the server crate wires these
//! pieces to listeners, forwarders and the node pool.

mod application;
mod catalog;
mod config;
mod error;
mod pattern;
mod protocol;
mod routes;

pub mod payload;
pub mod policy;
pub mod proto;

pub use application::{application_names, new_application, Application, RouteManifest};
pub use config::{
    parse_coins, FirewallConfig, ForwardConfig, ForwardMode, NodePoolConfig, TierUris,
};
pub use error::{Error, PolicyViolation};
pub use pattern::PathPattern;
pub use policy::{ChainPolicy, PolicyValidator};
pub use protocol::{NodeTier, Protocol};
pub use routes::RouteRegistry;

pub type Result<T> = std::result::Result<T, Error>;

/// Well-known paths and type URLs
pub mod constants {
    /// REST simulate endpoint
    pub const REST_SIMULATE: &str = "/cosmos/tx/v1beta1/simulate";
    /// REST broadcast endpoint
    pub const REST_BROADCAST: &str = "/cosmos/tx/v1beta1/txs";
    /// gRPC simulate method
    pub const GRPC_SIMULATE: &str = "/cosmos.tx.v1beta1.Service/Simulate";
    /// gRPC broadcast method
    pub const GRPC_BROADCAST: &str = "/cosmos.tx.v1beta1.Service/BroadcastTx";
    /// gRPC latest block query used for node health probes
    pub const GRPC_GET_LATEST_BLOCK: &str = "/cosmos.base.tendermint.v1beta1.Service/GetLatestBlock";
    /// REST latest block query used for node health probes
    pub const REST_LATEST_BLOCK: &str = "/cosmos/base/tendermint/v1beta1/blocks/latest";

    /// JSON-RPC methods whose `tx` parameter is inspected
    pub const JSON_RPC_TX_METHODS: [&str; 4] = [
        "broadcast_tx_commit",
        "check_tx",
        "broadcast_tx_sync",
        "broadcast_tx_async",
    ];

    pub const SECP256K1_PUBKEY: &str = "/cosmos.crypto.secp256k1.PubKey";
    pub const ETH_SECP256K1_PUBKEY: &str = "/ethermint.crypto.v1.ethsecp256k1.PubKey";

    /// Encoded length of a compressed secp256k1 public key inside its `Any` wrapper
    pub const PUBLIC_KEY_LEN: usize = 35;

    pub const DEFAULT_MINIMUM_GAS_LIMIT: u64 = 30_000;
    pub const DEFAULT_MAX_MEMO: usize = 256;
}
