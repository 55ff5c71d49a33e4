//! Firewall server: one listener per protocol, shared state, graceful shutdown

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use firewall_core::{FirewallConfig, Protocol};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{Result, ServerError};
use crate::handlers::{grpc, jsonrpc, rest};
use crate::metrics;
use crate::splice::wait_for_shutdown;
use crate::state::{FirewallState, SharedState};

/// Every path goes to the JSON-RPC handler, which checks it against the allow-list
pub fn json_rpc_router(state: SharedState) -> Router {
    Router::new()
        .fallback(jsonrpc::handle)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub fn rest_router(state: SharedState) -> Router {
    Router::new()
        .fallback(rest::handle)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// gRPC over HTTP/2 cleartext; the path is the full method name
pub fn grpc_router(state: SharedState) -> Router {
    Router::new()
        .fallback(grpc::handle)
        .with_state(state)
        .layer(TraceLayer::new_for_grpc())
}

/// Bound sockets for the three surfaces
pub struct Listeners {
    json_rpc: TcpListener,
    grpc: TcpListener,
    rest: TcpListener,
}

impl Listeners {
    pub fn local_addr(&self, protocol: Protocol) -> Result<SocketAddr> {
        let listener = match protocol {
            Protocol::JsonRpc => &self.json_rpc,
            Protocol::Grpc => &self.grpc,
            Protocol::Rest => &self.rest,
        };
        Ok(listener.local_addr()?)
    }
}

/// Validating reverse proxy for JSON-RPC, gRPC and REST
pub struct FirewallServer {
    config: FirewallConfig,
    state: SharedState,
    shutdown: watch::Receiver<bool>,
}

impl FirewallServer {
    pub fn config(&self) -> &FirewallConfig {
        &self.config
    }

    /// Get the server state for testing
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Bind all three listen addresses
    pub async fn bind(&self) -> Result<Listeners> {
        Ok(Listeners {
            json_rpc: TcpListener::bind(self.config.json_rpc_address).await?,
            grpc: TcpListener::bind(self.config.grpc_address).await?,
            rest: TcpListener::bind(self.config.rest_address).await?,
        })
    }

    pub async fn run(self) -> Result<()> {
        let listeners = self.bind().await?;
        self.serve(listeners).await
    }

    /// Serve until shutdown is signalled, then drain for at most the grace period
    pub async fn serve(self, listeners: Listeners) -> Result<()> {
        if let Some(addr) = self.config.metrics_address {
            metrics::install_prometheus_exporter(addr)
                .map_err(|e| ServerError::Internal(format!("failed to install metrics exporter: {e}")))?;
            info!(%addr, "metrics exporter listening");
        }

        if let Some(pools) = self.state.forwarder.pools() {
            tokio::spawn(pools.run(self.shutdown.clone()));
        }

        for protocol in Protocol::ALL {
            info!(%protocol, addr = %listeners.local_addr(protocol)?, "listening");
        }
        info!(
            app = self.state.validator.routes().app_name(),
            forwarding = self.state.forwarder.enabled(),
            "firewall started"
        );

        let Listeners { json_rpc, grpc, rest } = listeners;
        let json_rpc = axum::serve(json_rpc, json_rpc_router(self.state.clone()))
            .with_graceful_shutdown(wait_for_shutdown(self.shutdown.clone()))
            .into_future();
        let grpc = axum::serve(grpc, grpc_router(self.state.clone()))
            .with_graceful_shutdown(wait_for_shutdown(self.shutdown.clone()))
            .into_future();
        let rest = axum::serve(rest, rest_router(self.state.clone()))
            .with_graceful_shutdown(wait_for_shutdown(self.shutdown.clone()))
            .into_future();

        let grace = self.config.shutdown_grace();
        let deadline = async {
            wait_for_shutdown(self.shutdown.clone()).await;
            info!(?grace, "shutting down, draining in-flight requests");
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = async { tokio::try_join!(json_rpc, grpc, rest) } => {
                result?;
                info!("firewall stopped");
            }
            _ = deadline => {
                warn!("grace period elapsed, dropping remaining connections");
            }
        }
        Ok(())
    }
}

/// Builder for FirewallServer
pub struct ServerBuilder {
    config: FirewallConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl ServerBuilder {
    pub fn new(config: FirewallConfig) -> Self {
        Self {
            config,
            shutdown: None,
        }
    }

    /// Stop serving once `true` is published on this channel
    pub fn shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Validate the configuration and materialize the route tables
    ///
    /// Must be called within a tokio runtime.
    pub fn build(self) -> Result<FirewallServer> {
        self.config.validate_basic()?;

        // without a channel the server runs until the process exits
        let shutdown = self.shutdown.unwrap_or_else(|| watch::channel(false).1);
        let state = Arc::new(FirewallState::from_config(&self.config, shutdown.clone())?);

        Ok(FirewallServer {
            config: self.config,
            state,
            shutdown,
        })
    }
}
