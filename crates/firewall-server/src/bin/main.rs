//! cosmos-firewall binary
//!
//! Run with:
//! ```bash
//! cargo run -p firewall-server --bin cosmos-firewall -- start --config firewall.json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use firewall_core::payload::uri_tx_param;
use firewall_core::{
    application_names, parse_coins, FirewallConfig, PolicyValidator, Protocol, RouteRegistry,
};
use firewall_server::ServerBuilder;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cosmos-firewall")]
#[command(about = "Validating reverse proxy for Cosmos SDK nodes")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the JSON-RPC, gRPC and REST listeners
    Start(StartArgs),

    /// Print whether a route is allowed
    Verify {
        /// JSON-RPC path, gRPC full method or REST path
        route: String,

        /// jsonrpc, grpc or rest
        #[arg(long, short = 't', default_value = "rest")]
        request_type: Protocol,

        /// Built-in application
        #[arg(long, default_value = "cosmoshub")]
        app: String,

        /// Route manifest replacing the built-in application
        #[arg(long)]
        routes_file: Option<PathBuf>,
    },

    /// Print the allow-lists of an application
    List {
        /// Built-in application; omit to list the known applications
        app: Option<String>,

        /// Only this protocol's routes
        request_type: Option<Protocol>,
    },

    /// Check a signed transaction against the chain policy
    CheckTx {
        /// TxRaw bytes, base64 or 0x-prefixed hex
        tx: String,

        /// Configuration file holding the chain policy
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct StartArgs {
    /// JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[arg(long)]
    json_rpc_address: Option<SocketAddr>,

    #[arg(long)]
    grpc_address: Option<SocketAddr>,

    #[arg(long)]
    rest_address: Option<SocketAddr>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Chain id, also selects the built-in route catalog
    #[arg(long)]
    chain_id: Option<String>,

    /// Route manifest replacing the built-in catalog
    #[arg(long)]
    routes_file: Option<PathBuf>,

    /// Minimum fee, e.g. 400FX,10uatom
    #[arg(long)]
    minimum_fee: Option<String>,

    #[arg(long)]
    minimum_gas_limit: Option<u64>,

    #[arg(long)]
    max_memo: Option<usize>,

    /// Forward allowed requests to the static backend
    #[arg(long)]
    forward: bool,

    #[arg(long)]
    forward_json_rpc: Option<String>,

    #[arg(long)]
    forward_grpc: Option<String>,

    #[arg(long)]
    forward_rest: Option<String>,
}

impl StartArgs {
    fn into_config(self) -> anyhow::Result<FirewallConfig> {
        let mut config = match &self.config {
            Some(path) => FirewallConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => FirewallConfig::default(),
        };

        if let Some(addr) = self.json_rpc_address {
            config.json_rpc_address = addr;
        }
        if let Some(addr) = self.grpc_address {
            config.grpc_address = addr;
        }
        if let Some(addr) = self.rest_address {
            config.rest_address = addr;
        }
        if self.metrics_address.is_some() {
            config.metrics_address = self.metrics_address;
        }
        if let Some(chain_id) = self.chain_id {
            config.chain.chain_id = chain_id;
        }
        if self.routes_file.is_some() {
            config.routes_file = self.routes_file;
        }
        if let Some(fee) = self.minimum_fee {
            config.chain.minimum_fee = parse_coins(&fee).context("invalid --minimum-fee")?;
        }
        if let Some(gas) = self.minimum_gas_limit {
            config.chain.minimum_gas_limit = gas;
        }
        if let Some(max_memo) = self.max_memo {
            config.chain.max_memo = max_memo;
        }

        let targets = [
            (self.forward_json_rpc, &mut config.forward.json_rpc),
            (self.forward_grpc, &mut config.forward.grpc),
            (self.forward_rest, &mut config.forward.rest),
        ];
        let mut any_target = false;
        for (flag, target) in targets {
            if let Some(uri) = flag {
                *target = uri;
                any_target = true;
            }
        }
        if self.forward || any_target {
            config.forward.enable = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cli.log_level).context("invalid --log-level")?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Start(args) => start(args.into_config()?).await,
        Command::Verify {
            route,
            request_type,
            app,
            routes_file,
        } => {
            let routes = match routes_file {
                Some(path) => RouteRegistry::from_manifest(path)?,
                None => RouteRegistry::for_app(&app)?,
            };
            let allowed = routes.is_allowed(request_type, &route);
            println!(
                "{} {} route {} for {}",
                if allowed { "[OK]" } else { "[DENIED]" },
                request_type,
                route,
                routes.app_name()
            );
            if !allowed {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::List { app, request_type } => {
            let Some(app) = app else {
                for name in application_names() {
                    println!("{name}");
                }
                return Ok(());
            };
            let routes = RouteRegistry::for_app(&app)?;
            let protocols = match request_type {
                Some(protocol) => vec![protocol],
                None => Protocol::ALL.to_vec(),
            };
            for protocol in protocols {
                println!("# {protocol} ({} routes)", routes.routes(protocol).len());
                for route in routes.routes(protocol) {
                    println!("{route}");
                }
            }
            Ok(())
        }
        Command::CheckTx { tx, config } => {
            let config = match config {
                Some(path) => FirewallConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => FirewallConfig::default(),
            };
            let routes = match &config.routes_file {
                Some(path) => RouteRegistry::from_manifest(path)?,
                None => RouteRegistry::for_app(&config.chain.chain_id)?,
            };
            let validator = PolicyValidator::new(config.chain, Arc::new(routes));
            let raw = uri_tx_param(tx.trim()).context("tx is neither base64 nor 0x hex")?;
            match validator.check_tx_bytes(&raw) {
                Ok(()) => {
                    println!("[OK] transaction passes the chain policy");
                    Ok(())
                }
                Err(e) => bail!("transaction rejected: {e}"),
            }
        }
    }
}

async fn start(config: FirewallConfig) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = ServerBuilder::new(config)
        .shutdown(shutdown_rx)
        .build()
        .context("failed to start firewall")?;

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.run().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
