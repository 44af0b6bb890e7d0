// crates/strand-cli/src/commands/pool.rs
//
// `strand pool {create, list, refresh}`: replication pool commands.

use clap::Subcommand;
use serde_json::json;
use tabled::Tabled;
use uuid::Uuid;

use strand_core::ids::ContentHash;
use strand_rpc::handlers::pool::{ListPoolsResponse, PoolView};

use crate::output::{format_address, format_json, format_table, format_trust, OutputFormat};
use crate::rpc_client::RpcClient;

/// Pool management subcommands.
#[derive(Debug, Subcommand)]
pub enum PoolCmd {
    /// Create (or refresh) the pool for a hash from its eligible holders.
    Create {
        /// Content hash (64 hex chars).
        hash: ContentHash,
    },
    /// List pools, optionally only the one for a hash.
    List {
        #[arg(long)]
        hash: Option<ContentHash>,
    },
    /// Recompute a pool's membership from current trust.
    Refresh {
        /// Pool UUID.
        pool_id: Uuid,
    },
}

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "POOL")]
    pool_id: String,
    #[tabled(rename = "HASH")]
    hash: String,
    #[tabled(rename = "MEMBERS")]
    members: usize,
    #[tabled(rename = "VERIFIED")]
    verified: usize,
    #[tabled(rename = "REFRESHED")]
    refreshed_at: String,
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "NODE")]
    node: String,
    #[tabled(rename = "TRUST")]
    trust: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
}

/// Run the pool subcommand.
pub async fn run(
    client: &RpcClient,
    cmd: &PoolCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        PoolCmd::Create { hash } => {
            let pool: PoolView = client.call("pool/create", &json!({ "hash": hash })).await?;
            print_pool(&pool, format);
        }
        PoolCmd::List { hash } => {
            let resp: ListPoolsResponse = client.call("pool/list", &json!({ "hash": hash })).await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&resp));
            } else if resp.pools.is_empty() {
                println!("No pools.");
            } else {
                let rows: Vec<PoolRow> = resp
                    .pools
                    .iter()
                    .map(|p| PoolRow {
                        pool_id: p.pool_id.to_string(),
                        hash: p.hash.short(),
                        members: p.members.len(),
                        verified: p.members.iter().filter(|m| m.is_verified()).count(),
                        refreshed_at: p.refreshed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    })
                    .collect();
                println!("{}", format_table(&rows));
            }
        }
        PoolCmd::Refresh { pool_id } => {
            let pool: PoolView = client
                .call("pool/refresh", &json!({ "pool_id": pool_id }))
                .await?;
            print_pool(&pool, format);
        }
    }
    Ok(())
}

fn print_pool(pool: &PoolView, format: OutputFormat) {
    if format == OutputFormat::Json {
        println!("{}", format_json(pool));
        return;
    }
    println!("Pool {} for {}", pool.pool_id, pool.hash);
    let rows: Vec<MemberRow> = pool
        .members
        .iter()
        .map(|m| MemberRow {
            node: m.node.short(),
            trust: format_trust(m.trust),
            address: format_address(m.address.as_ref()),
        })
        .collect();
    println!("{}", format_table(&rows));
}
