//! Shared harness for the end-to-end suites
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;
use firewall_core::constants::{DEFAULT_MINIMUM_GAS_LIMIT, PUBLIC_KEY_LEN, SECP256K1_PUBKEY};
use firewall_core::proto::{Any, AuthInfo, Coin, Fee, ModeInfo, SignMode, SignerInfo, TxBody, TxRaw};
use firewall_core::{ChainPolicy, FirewallConfig, ForwardConfig, Protocol};
use firewall_server::ServerBuilder;
use prost::Message;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};

pub const MSG_SEND: &str = "/cosmos.bank.v1beta1.MsgSend";

/// A signed-looking `TxRaw` with one MsgSend paying `fee`
pub fn tx_bytes(fee: Coin) -> Vec<u8> {
    let body = TxBody {
        messages: vec![Any {
            type_url: MSG_SEND.into(),
            value: vec![1, 2, 3],
        }],
        memo: "e2e".into(),
        ..Default::default()
    };
    let auth_info = AuthInfo {
        signer_infos: vec![SignerInfo {
            public_key: Some(Any {
                type_url: SECP256K1_PUBKEY.into(),
                value: vec![2u8; PUBLIC_KEY_LEN],
            }),
            mode_info: Some(ModeInfo::single(SignMode::Direct)),
            sequence: 0,
        }],
        fee: Some(Fee {
            amount: vec![fee],
            gas_limit: DEFAULT_MINIMUM_GAS_LIMIT,
            ..Default::default()
        }),
        tip: None,
    };
    TxRaw {
        body_bytes: body.encode_to_vec(),
        auth_info_bytes: auth_info.encode_to_vec(),
        signatures: vec![vec![9u8; 64]],
    }
    .encode_to_vec()
}

pub fn valid_tx() -> Vec<u8> {
    tx_bytes(Coin::new("uatom", "10"))
}

pub fn underpriced_tx() -> Vec<u8> {
    tx_bytes(Coin::new("uatom", "1"))
}

/// cosmoshub routes, 10uatom minimum fee, ephemeral ports, no forwarding
pub fn local_config() -> FirewallConfig {
    FirewallConfig {
        json_rpc_address: "127.0.0.1:0".parse().unwrap(),
        grpc_address: "127.0.0.1:0".parse().unwrap(),
        rest_address: "127.0.0.1:0".parse().unwrap(),
        shutdown_grace_secs: 1,
        chain: ChainPolicy {
            chain_id: "cosmoshub".into(),
            minimum_fee: vec![Coin::new("uatom", "10")],
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Static forwarding of all three protocols to `upstream`
pub fn forward_config(upstream: &str) -> FirewallConfig {
    FirewallConfig {
        forward: ForwardConfig {
            enable: true,
            json_rpc: upstream.into(),
            grpc: upstream.into(),
            rest: upstream.into(),
            timeout_secs: 5,
            proxy: None,
        },
        ..local_config()
    }
}

/// A running firewall; stops when dropped
pub struct Firewall {
    pub json_rpc_url: String,
    pub grpc_url: String,
    pub rest_url: String,
    _shutdown: watch::Sender<bool>,
}

impl Firewall {
    pub async fn start(config: FirewallConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = ServerBuilder::new(config)
            .shutdown(shutdown_rx)
            .build()
            .expect("firewall should build");
        let listeners = server.bind().await.expect("bind should succeed");
        let url = |protocol| format!("http://{}", listeners.local_addr(protocol).unwrap());
        let (json_rpc_url, grpc_url, rest_url) = (
            url(Protocol::JsonRpc),
            url(Protocol::Grpc),
            url(Protocol::Rest),
        );

        tokio::spawn(server.serve(listeners));

        Self {
            json_rpc_url,
            grpc_url,
            rest_url,
            _shutdown: shutdown_tx,
        }
    }
}

/// An in-process upstream; stops when dropped
pub struct MockServer {
    pub url: String,
    pub addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

pub async fn serve(router: Router) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });
    MockServer {
        url: format!("http://{addr}"),
        addr,
        _shutdown: shutdown_tx,
    }
}

/// An address nothing listens on
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Request counter shared with a mock upstream
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
