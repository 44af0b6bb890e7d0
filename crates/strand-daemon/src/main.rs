// crates/strand-daemon/src/main.rs
//
// Binary entrypoint for the Strand daemon.
//
// Initializes tracing, parses CLI arguments, loads configuration and the node
// key, restores the location registry from RocksDB, then runs the RPC server
// and the re-probe scheduler until Ctrl-C.

mod config;
mod scheduler;
mod state;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::sync::watch;

use config::DaemonConfig;
use scheduler::ReprobeScheduler;
use state::{NodeState, NodeStateMachine};

use strand_core::crypto::Keypair;
use strand_probe::HttpTransport;
use strand_registry::LocationRegistry;
use strand_rpc::{NodeServices, StrandRpcServer};
use strand_store::{FsContentStore, RocksRegistryStore};

/// Strand daemon: tracks who holds which content and how far to trust them.
#[derive(Parser, Debug)]
#[command(name = "strand-daemon", version = "0.1.0", about = "Strand node daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.strand/config.toml")]
    config: String,

    /// Override the RPC port from the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Override the data directory from the config file.
    #[arg(long)]
    data_dir: Option<String>,

    /// Override this node's public URL from the config file.
    #[arg(long)]
    self_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config_path = expand_tilde(&args.config);

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found. A file that exists but is invalid is fatal.
    let (mut daemon_config, load_note) = if Path::new(&config_path).exists() {
        (
            DaemonConfig::load(&config_path)?,
            format!("Loaded configuration from {}", config_path),
        )
    } else {
        (
            DaemonConfig::default(),
            format!("No config at {}, using defaults", config_path),
        )
    };

    // CLI flags override the config file.
    if let Some(port) = args.port {
        daemon_config.rpc.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        daemon_config.node.data_dir = data_dir;
    }
    if args.self_url.is_some() {
        daemon_config.node.self_url = args.self_url;
    }
    daemon_config.validate()?;

    // Initialize tracing subscriber; RUST_LOG wins over the config log level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    let start_time = Instant::now();
    let mut state_machine = NodeStateMachine::new();

    tracing::info!("Strand Daemon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("{}", load_note);
    tracing::info!("Data directory: {}", daemon_config.node.data_dir);
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc.host,
        daemon_config.rpc.port
    );

    // ---------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------
    let key_path = expand_tilde(&daemon_config.node.key_path);
    let (keypair, generated) = Keypair::load_or_generate(Path::new(&key_path))?;
    if generated {
        tracing::warn!("No node key found, generated a new one at {}", key_path);
    }
    tracing::info!("Node ID: {}", keypair.node_id());
    let self_address = daemon_config.self_address()?;
    if self_address.is_none() {
        tracing::warn!("node.self_url is not set; peers will not learn how to reach this node");
    }

    // ---------------------------------------------------------------
    // Storage and registry restore
    // ---------------------------------------------------------------
    state_machine.transition(NodeState::Restoring)?;
    let data_dir = expand_tilde(&daemon_config.node.data_dir);
    let registry_store = Arc::new(RocksRegistryStore::open(&format!("{}/registry", data_dir))?);
    let content = Arc::new(FsContentStore::open(format!("{}/blobs", data_dir)).await?);
    let registry =
        Arc::new(LocationRegistry::restore(daemon_config.trust.clone(), registry_store).await?);
    tracing::info!(
        "Registry ready: {} entries across {} hashes",
        registry.len().await,
        registry.hashes().await.len()
    );

    let mut services = NodeServices::new(
        Arc::new(keypair),
        self_address,
        registry,
        Arc::new(
            HttpTransport::new(daemon_config.probe.timeout())
                .with_max_response_bytes(daemon_config.probe.max_response_bytes),
        ),
        daemon_config.probe.timeout(),
        content,
    );
    if let Some(root) = &daemon_config.node.share_root {
        let root = expand_tilde(root);
        tracing::info!("Path shares allowed under {}", root);
        services = services.with_share_root(root);
    }
    if daemon_config.rpc.allow_remote_control {
        tracing::warn!("Control methods are served to non-loopback callers");
    }

    // ---------------------------------------------------------------
    // Serve
    // ---------------------------------------------------------------
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let rpc_server = StrandRpcServer::new(daemon_config.rpc.clone(), services.clone())
        .with_lifecycle(state_machine.subscribe())
        .with_start_time(start_time);
    let mut rpc_shutdown = shutdown_rx.clone();
    let rpc_task = tokio::spawn(async move {
        let signal = async move {
            let _ = rpc_shutdown.wait_for(|stop| *stop).await;
        };
        if let Err(e) = rpc_server.start_with_shutdown(signal).await {
            tracing::error!("RPC server error: {}", e);
        }
    });

    let scheduler_task = match daemon_config.probe.interval() {
        Some(interval) => {
            let scheduler =
                ReprobeScheduler::new(services, interval, daemon_config.probe.max_concurrency);
            let rx = shutdown_rx.clone();
            Some(tokio::spawn(async move { scheduler.run(rx).await }))
        }
        None => {
            tracing::info!("Background re-probing disabled (probe.interval_secs = 0)");
            None
        }
    };

    state_machine.transition(NodeState::Running)?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    state_machine.transition(NodeState::ShuttingDown)?;
    let _ = shutdown_tx.send(true);

    if let Err(e) = rpc_task.await {
        tracing::error!("RPC task failed: {}", e);
    }
    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            tracing::error!("Scheduler task failed: {}", e);
        }
    }

    tracing::info!("Strand daemon stopped");
    Ok(())
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}
