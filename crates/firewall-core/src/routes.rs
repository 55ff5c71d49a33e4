//! Route allow-lists for one backend application

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::application::{new_application, Application, RouteManifest};
use crate::pattern::{is_template, PathPattern};
use crate::{Protocol, Result};

/// Routes of one protocol, kept in declaration order plus a lowercase index
struct RouteSet {
    routes: Vec<String>,
    index: HashSet<String>,
}

impl RouteSet {
    fn new(routes: Vec<String>) -> Self {
        let index = routes.iter().map(|r| r.to_ascii_lowercase()).collect();
        Self { routes, index }
    }

    fn contains(&self, route: &str) -> bool {
        self.index.contains(&route.to_ascii_lowercase())
    }
}

/// REST routes split into exact paths and compiled templates
struct RestRoutes {
    templates: Vec<String>,
    exact: HashSet<String>,
    patterns: Vec<PathPattern>,
}

impl RestRoutes {
    fn new(templates: Vec<String>) -> Self {
        let mut exact = HashSet::new();
        let mut patterns = Vec::new();
        for template in &templates {
            if !is_template(template) {
                exact.insert(template.to_ascii_lowercase());
                continue;
            }
            match PathPattern::new(template) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => warn!(error = %e, "skipping REST route"),
            }
        }
        Self {
            templates,
            exact,
            patterns,
        }
    }

    fn matches(&self, path: &str) -> bool {
        if self.exact.contains(&strip_query(path).to_ascii_lowercase()) {
            return true;
        }
        self.patterns.iter().any(|p| p.matches(path))
    }
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}

/// Allow-lists for the JSON-RPC, gRPC and REST surfaces of an application
///
/// Each list is materialized from the [`Application`] on first use and never
/// recomputed; concurrent first callers block on the same initialization.
pub struct RouteRegistry {
    app: Box<dyn Application>,
    json_rpc: OnceLock<RouteSet>,
    grpc: OnceLock<RouteSet>,
    rest: OnceLock<RestRoutes>,
}

impl RouteRegistry {
    pub fn new(app: Box<dyn Application>) -> Self {
        Self {
            app,
            json_rpc: OnceLock::new(),
            grpc: OnceLock::new(),
            rest: OnceLock::new(),
        }
    }

    /// Registry for a built-in application; fails on an unknown identity
    pub fn for_app(app_id: &str) -> Result<Self> {
        Ok(Self::new(new_application(app_id)?))
    }

    /// Registry for an application described by a route manifest file
    pub fn from_manifest(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Box::new(RouteManifest::load(path)?)))
    }

    pub fn app_name(&self) -> &str {
        self.app.name()
    }

    /// Materialize all three lists now instead of on the first request
    pub fn warm(&self) {
        let rpc = self.rpc_routes().len();
        let grpc = self.grpc_routes().len();
        let rest = self.rest_routes().len();
        debug!(app = self.app.name(), rpc, grpc, rest, "route tables loaded");
    }

    pub fn rpc_routes(&self) -> &[String] {
        &self.rpc_set().routes
    }

    pub fn grpc_routes(&self) -> &[String] {
        &self.grpc_set().routes
    }

    pub fn rest_routes(&self) -> &[String] {
        &self.rest_set().templates
    }

    pub fn routes(&self, protocol: Protocol) -> &[String] {
        match protocol {
            Protocol::JsonRpc => self.rpc_routes(),
            Protocol::Grpc => self.grpc_routes(),
            Protocol::Rest => self.rest_routes(),
        }
    }

    /// Case-insensitive allow-list membership
    ///
    /// JSON-RPC and gRPC compare exactly; REST also tries every compiled
    /// template. A trailing query string is ignored.
    pub fn is_allowed(&self, protocol: Protocol, path: &str) -> bool {
        match protocol {
            Protocol::JsonRpc => self.rpc_set().contains(strip_query(path)),
            Protocol::Grpc => self.grpc_set().contains(path),
            Protocol::Rest => self.rest_set().matches(path),
        }
    }

    fn rpc_set(&self) -> &RouteSet {
        self.json_rpc
            .get_or_init(|| RouteSet::new(self.app.list_json_rpc_methods()))
    }

    fn grpc_set(&self) -> &RouteSet {
        self.grpc
            .get_or_init(|| RouteSet::new(self.app.list_grpc_methods()))
    }

    fn rest_set(&self) -> &RestRoutes {
        self.rest
            .get_or_init(|| RestRoutes::new(self.app.list_rest_templates()))
    }
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("app", &self.app.name())
            .field("loaded", &self.rest.get().is_some())
            .finish()
    }
}
