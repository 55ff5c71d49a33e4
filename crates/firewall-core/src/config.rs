//! Firewall configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::policy::ChainPolicy;
use crate::proto::Coin;
use crate::{Error, NodeTier, Protocol, Result};

/// Top-level configuration, usually loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallConfig {
    /// Tendermint JSON-RPC listener
    #[serde(default = "default_json_rpc_address")]
    pub json_rpc_address: SocketAddr,
    /// gRPC listener (HTTP/2 cleartext)
    #[serde(default = "default_grpc_address")]
    pub grpc_address: SocketAddr,
    /// REST gateway listener
    #[serde(default = "default_rest_address")]
    pub rest_address: SocketAddr,
    /// Prometheus exporter listener; disabled when unset
    #[serde(default)]
    pub metrics_address: Option<SocketAddr>,
    /// How long in-flight requests may drain after shutdown is signalled
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Route manifest replacing the built-in tables for `chain.chain_id`
    #[serde(default)]
    pub routes_file: Option<PathBuf>,
    #[serde(default)]
    pub chain: ChainPolicy,
    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub nodes: Option<NodePoolConfig>,
}

fn default_json_rpc_address() -> SocketAddr {
    ([0, 0, 0, 0], 26657).into()
}

fn default_grpc_address() -> SocketAddr {
    ([0, 0, 0, 0], 9090).into()
}

fn default_rest_address() -> SocketAddr {
    ([0, 0, 0, 0], 1317).into()
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_check_interval_secs() -> u64 {
    10
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            json_rpc_address: default_json_rpc_address(),
            grpc_address: default_grpc_address(),
            rest_address: default_rest_address(),
            metrics_address: None,
            shutdown_grace_secs: default_shutdown_grace_secs(),
            routes_file: None,
            chain: ChainPolicy::default(),
            forward: ForwardConfig::default(),
            nodes: None,
        }
    }
}

/// A single static backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "default_forward_json_rpc")]
    pub json_rpc: String,
    #[serde(default = "default_forward_grpc")]
    pub grpc: String,
    #[serde(default = "default_forward_rest")]
    pub rest: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Outbound HTTP proxy for JSON-RPC and REST forwarding
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_forward_json_rpc() -> String {
    "http://127.0.0.1:26657".to_string()
}

fn default_forward_grpc() -> String {
    "http://127.0.0.1:9090".to_string()
}

fn default_forward_rest() -> String {
    "http://127.0.0.1:1317".to_string()
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            enable: false,
            json_rpc: default_forward_json_rpc(),
            grpc: default_forward_grpc(),
            rest: default_forward_rest(),
            timeout_secs: default_timeout_secs(),
            proxy: None,
        }
    }
}

impl ForwardConfig {
    pub fn target(&self, protocol: Protocol) -> &str {
        match protocol {
            Protocol::JsonRpc => &self.json_rpc,
            Protocol::Grpc => &self.grpc,
            Protocol::Rest => &self.rest,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Backend URIs of one protocol, split by tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierUris {
    #[serde(default)]
    pub light: Vec<String>,
    #[serde(default)]
    pub full: Vec<String>,
    #[serde(default)]
    pub archive: Vec<String>,
}

impl TierUris {
    pub fn tier(&self, tier: NodeTier) -> &[String] {
        match tier {
            NodeTier::Light => &self.light,
            NodeTier::Full => &self.full,
            NodeTier::Archive => &self.archive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.light.is_empty() && self.full.is_empty() && self.archive.is_empty()
    }
}

/// Dynamic node pools with periodic health checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePoolConfig {
    #[serde(default)]
    pub json_rpc: TierUris,
    #[serde(default)]
    pub grpc: TierUris,
    #[serde(default)]
    pub rest: TierUris,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

impl Default for NodePoolConfig {
    fn default() -> Self {
        Self {
            json_rpc: TierUris::default(),
            grpc: TierUris::default(),
            rest: TierUris::default(),
            timeout_secs: default_timeout_secs(),
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

impl NodePoolConfig {
    pub fn uris(&self, protocol: Protocol) -> &TierUris {
        match protocol {
            Protocol::JsonRpc => &self.json_rpc,
            Protocol::Grpc => &self.grpc,
            Protocol::Rest => &self.rest,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Where allowed requests go
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardMode {
    /// Answer locally with a success stub
    Local,
    /// Relay to one static backend triple
    Static(ForwardConfig),
    /// Relay to the best node of a health-checked pool
    Pool(NodePoolConfig),
}

impl FirewallConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate_basic(&self) -> Result<()> {
        self.chain.validate_basic()?;

        let addrs = [self.json_rpc_address, self.grpc_address, self.rest_address];
        for (i, a) in addrs.iter().enumerate() {
            if a.port() != 0 && addrs[i + 1..].contains(a) {
                return Err(Error::Config(format!("listen address {a} is used twice")));
            }
        }

        if self.forward.enable && self.nodes.is_some() {
            return Err(Error::Config(
                "static forwarding and node pools are mutually exclusive".into(),
            ));
        }

        if self.forward.enable {
            for protocol in Protocol::ALL {
                if self.forward.target(protocol).is_empty() {
                    return Err(Error::Config(format!("forward target for {protocol} is empty")));
                }
            }
            if self.forward.timeout_secs == 0 {
                return Err(Error::Config("forward timeout must be positive".into()));
            }
        }

        if let Some(nodes) = &self.nodes {
            if Protocol::ALL.iter().all(|p| nodes.uris(*p).is_empty()) {
                return Err(Error::Config("node pool has no nodes".into()));
            }
            if nodes.timeout_secs == 0 || nodes.check_interval_secs == 0 {
                return Err(Error::Config(
                    "node pool timeout and check interval must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn forward_mode(&self) -> ForwardMode {
        match (&self.nodes, self.forward.enable) {
            (Some(nodes), _) => ForwardMode::Pool(nodes.clone()),
            (None, true) => ForwardMode::Static(self.forward.clone()),
            (None, false) => ForwardMode::Local,
        }
    }

    pub fn address(&self, protocol: Protocol) -> SocketAddr {
        match protocol {
            Protocol::JsonRpc => self.json_rpc_address,
            Protocol::Grpc => self.grpc_address,
            Protocol::Rest => self.rest_address,
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Parse a coin list such as `400FX,10uatom`
pub fn parse_coins(s: &str) -> Result<Vec<Coin>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let split = part
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(|| Error::Config(format!("coin {part:?} has no denom")))?;
            let (amount, denom) = part.split_at(split);
            if amount.is_empty() {
                return Err(Error::Config(format!("coin {part:?} has no amount")));
            }
            Ok(Coin::new(denom, amount))
        })
        .collect()
}
