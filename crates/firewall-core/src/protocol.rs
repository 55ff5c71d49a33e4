//! Protocol and node tier identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Wire protocol a request arrives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Tendermint JSON-RPC (default port 26657)
    #[serde(rename = "jsonrpc")]
    JsonRpc,
    /// Cosmos SDK gRPC (default port 9090)
    Grpc,
    /// Cosmos SDK REST gateway (default port 1317)
    Rest,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::JsonRpc, Protocol::Grpc, Protocol::Rest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::JsonRpc => "jsonrpc",
            Protocol::Grpc => "grpc",
            Protocol::Rest => "rest",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonrpc" | "json-rpc" | "json_rpc" | "rpc" => Ok(Protocol::JsonRpc),
            "grpc" => Ok(Protocol::Grpc),
            "rest" | "api" => Ok(Protocol::Rest),
            other => Err(Error::Config(format!(
                "unknown request type {other:?}, expected jsonrpc, grpc or rest"
            ))),
        }
    }
}

/// Data-completeness class of a backend node
///
/// Each tier keeps its own failover list inside a node pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeTier {
    /// Pruned node, recent state only
    Light,
    /// Full node with default pruning
    Full,
    /// Archive node, complete history
    Archive,
}

impl NodeTier {
    pub const ALL: [NodeTier; 3] = [NodeTier::Light, NodeTier::Full, NodeTier::Archive];

    /// Order in which tiers are consulted when picking a forwarding target
    pub const PREFERENCE: [NodeTier; 3] = [NodeTier::Archive, NodeTier::Light, NodeTier::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeTier::Light => "light",
            NodeTier::Full => "full",
            NodeTier::Archive => "archive",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            NodeTier::Light => 0,
            NodeTier::Full => 1,
            NodeTier::Archive => 2,
        }
    }
}

impl fmt::Display for NodeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
