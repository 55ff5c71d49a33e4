//! Shared request-path state

use std::sync::Arc;

use firewall_core::{FirewallConfig, PolicyValidator, RouteRegistry};
use tokio::sync::watch;

use crate::error::Result;
use crate::forwarder::Forwarder;

/// Read-mostly state shared by every handler
pub struct FirewallState {
    /// Route allow-lists and transaction policy
    pub validator: Arc<PolicyValidator>,
    /// Where allowed requests go
    pub forwarder: Arc<Forwarder>,
}

impl FirewallState {
    pub fn new(validator: PolicyValidator, forwarder: Forwarder) -> Self {
        Self {
            validator: Arc::new(validator),
            forwarder: Arc::new(forwarder),
        }
    }

    /// Build the validator and forwarder from configuration
    ///
    /// The route registry is materialized here so an unknown application
    /// fails startup instead of the first request.
    pub fn from_config(config: &FirewallConfig, shutdown: watch::Receiver<bool>) -> Result<Self> {
        let routes = match &config.routes_file {
            Some(path) => RouteRegistry::from_manifest(path)?,
            None => RouteRegistry::for_app(&config.chain.chain_id)?,
        };
        routes.warm();

        let validator = PolicyValidator::new(config.chain.clone(), Arc::new(routes));
        let forwarder = Forwarder::new(&config.forward_mode(), shutdown)?;
        Ok(Self::new(validator, forwarder))
    }
}

pub type SharedState = Arc<FirewallState>;
