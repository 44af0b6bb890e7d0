// crates/strand-cli/src/main.rs
//
// CLI entrypoint for the Strand developer tools.
//
// Provides subcommands for initializing a node, sharing content, probing
// peers, querying holders, managing pools, pulling content and viewing
// node status.

mod commands;
mod output;
mod rpc_client;

use clap::{Parser, Subcommand};
use commands::content::ContentCmd;
use commands::pool::PoolCmd;
use commands::probe::ProbeCmd;
use commands::query::QueryCmd;
use commands::share::ShareCmd;
use output::OutputFormat;
use rpc_client::RpcClient;

/// Strand CLI: who holds which content, and how far to trust them.
#[derive(Parser, Debug)]
#[command(name = "strand", version = "0.1.0", about = "Strand content location and trust CLI")]
struct Cli {
    /// RPC endpoint for the strand-daemon.
    #[arg(long, global = true, default_value = "http://localhost:50051")]
    rpc: String,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a default config and generate the node key.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },

    /// Store content locally and announce this node as a holder.
    Share(ShareCmd),

    /// Probe one peer for one hash and update its trust.
    Probe(ProbeCmd),

    /// List holders of a hash ranked by trust.
    Query(QueryCmd),

    /// Pool management: create, list, refresh.
    #[command(subcommand)]
    Pool(PoolCmd),

    /// Local content: list, pull.
    #[command(subcommand)]
    Content(ContentCmd),

    /// Display node identity, lifecycle state and health.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = RpcClient::new(&cli.rpc);
    let format = OutputFormat::from_flag(cli.json);

    match &cli.command {
        Commands::Init { force } => commands::init::run(*force).await?,
        Commands::Share(cmd) => commands::share::run(&client, cmd, format).await?,
        Commands::Probe(cmd) => commands::probe::run(&client, cmd, format).await?,
        Commands::Query(cmd) => commands::query::run(&client, cmd, format).await?,
        Commands::Pool(cmd) => commands::pool::run(&client, cmd, format).await?,
        Commands::Content(cmd) => commands::content::run(&client, cmd, format).await?,
        Commands::Status => commands::status::run(&client, format).await?,
    }

    Ok(())
}
