//! Backend application route surfaces
//!
//! A backend application declares the routes it serves through the
//! [`Application`] enumeration contract. The registry calls these methods
//! once and caches the result.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::*;
use crate::{Error, Result};

/// Enumerates the endpoint surface of a backend application
pub trait Application: Send + Sync {
    /// Application identity, e.g. `cosmoshub`
    fn name(&self) -> &str;

    /// JSON-RPC routes, each with a leading slash (`/status`)
    fn list_json_rpc_methods(&self) -> Vec<String>;

    /// Fully qualified gRPC methods plus the message type URLs the app routes
    fn list_grpc_methods(&self) -> Vec<String>;

    /// REST paths and templates (`/blocks/{height}`)
    fn list_rest_templates(&self) -> Vec<String>;
}

/// Application assembled from the built-in route catalogs
#[derive(Clone, Copy)]
struct BuiltinApplication {
    name: &'static str,
    grpc: &'static [&'static [&'static str]],
    rest: &'static [&'static [&'static str]],
}

impl Application for BuiltinApplication {
    fn name(&self) -> &str {
        self.name
    }

    fn list_json_rpc_methods(&self) -> Vec<String> {
        to_owned(&[TENDERMINT_RPC])
    }

    fn list_grpc_methods(&self) -> Vec<String> {
        to_owned(self.grpc)
    }

    fn list_rest_templates(&self) -> Vec<String> {
        to_owned(self.rest)
    }
}

fn to_owned(tables: &[&[&str]]) -> Vec<String> {
    tables
        .iter()
        .flat_map(|table| table.iter().map(|route| route.to_string()))
        .collect()
}

const BUILTIN: &[BuiltinApplication] = &[
    BuiltinApplication {
        name: "cosmoshub",
        grpc: &[SDK_GRPC_METHODS, SDK_MSG_TYPES],
        rest: &[SDK_REST_TEMPLATES],
    },
    BuiltinApplication {
        name: "ethermint",
        grpc: &[
            SDK_GRPC_METHODS,
            SDK_MSG_TYPES,
            ETHERMINT_GRPC_METHODS,
            ETHERMINT_MSG_TYPES,
        ],
        rest: &[SDK_REST_TEMPLATES, ETHERMINT_REST_TEMPLATES],
    },
    BuiltinApplication {
        name: "fxcore",
        grpc: &[
            SDK_GRPC_METHODS,
            SDK_MSG_TYPES,
            ETHERMINT_GRPC_METHODS,
            ETHERMINT_MSG_TYPES,
            FXCORE_GRPC_METHODS,
            FXCORE_MSG_TYPES,
        ],
        rest: &[
            SDK_REST_TEMPLATES,
            ETHERMINT_REST_TEMPLATES,
            FXCORE_REST_TEMPLATES,
        ],
    },
];

/// Names of the built-in applications
pub fn application_names() -> Vec<&'static str> {
    BUILTIN.iter().map(|app| app.name).collect()
}

/// Look up a built-in application by identity (case-insensitive)
pub fn new_application(app_id: &str) -> Result<Box<dyn Application>> {
    BUILTIN
        .iter()
        .find(|app| app.name.eq_ignore_ascii_case(app_id))
        .map(|app| Box::new(*app) as Box<dyn Application>)
        .ok_or_else(|| Error::UnknownApplication {
            app_id: app_id.to_string(),
            known: application_names().join(", "),
        })
}

/// Route surface described in a JSON file
///
/// ```json
/// { "name": "mychain", "json_rpc": ["/status"], "grpc": [], "rest": ["/blocks/{height}"] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteManifest {
    pub name: String,
    #[serde(default)]
    pub json_rpc: Vec<String>,
    #[serde(default)]
    pub grpc: Vec<String>,
    #[serde(default)]
    pub rest: Vec<String>,
}

impl RouteManifest {
    /// Load a manifest from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let manifest: Self = serde_json::from_str(&content)?;
        if manifest.name.is_empty() {
            return Err(Error::Config(format!(
                "route manifest {} has no name",
                path.as_ref().display()
            )));
        }
        Ok(manifest)
    }

    /// Capture the surface of another application, e.g. to export a built-in catalog
    pub fn from_application(app: &dyn Application) -> Self {
        Self {
            name: app.name().to_string(),
            json_rpc: app.list_json_rpc_methods(),
            grpc: app.list_grpc_methods(),
            rest: app.list_rest_templates(),
        }
    }
}

impl Application for RouteManifest {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_json_rpc_methods(&self) -> Vec<String> {
        self.json_rpc.clone()
    }

    fn list_grpc_methods(&self) -> Vec<String> {
        self.grpc.clone()
    }

    fn list_rest_templates(&self) -> Vec<String> {
        self.rest.clone()
    }
}
