// crates/strand-cli/src/commands/share.rs
//
// `strand share <file>`: store content on the daemon and announce it.

use std::fs;

use clap::Args;
use serde_json::json;

use strand_rpc::handlers::content::ShareResponse;

use crate::output::{format_json, OutputFormat};
use crate::rpc_client::RpcClient;

#[derive(Debug, Args)]
pub struct ShareCmd {
    /// File to share.
    #[arg()]
    pub path: String,

    /// Let the daemon read the file itself instead of uploading its bytes.
    /// The file must sit under the daemon's `node.share_root`.
    #[arg(long)]
    pub daemon_side: bool,

    /// Also create (or refresh) the replication pool for the hash.
    #[arg(long)]
    pub pool: bool,
}

/// Run the share command.
pub async fn run(
    client: &RpcClient,
    cmd: &ShareCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = if cmd.daemon_side {
        let absolute = fs::canonicalize(&cmd.path)?;
        json!({ "path": absolute, "create_pool": cmd.pool })
    } else {
        let data = fs::read(&cmd.path)?;
        json!({ "data_hex": hex::encode(data), "create_pool": cmd.pool })
    };

    let resp: ShareResponse = client.call("content/share", &params).await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&resp));
        return Ok(());
    }

    println!("Shared {} ({} bytes)", resp.hash, resp.size);
    if !resp.newly_recorded {
        println!("  Already recorded as a holder.");
    }
    if let Some(pool) = resp.pool {
        println!("  Pool {} with {} members", pool.pool_id, pool.members.len());
    }
    Ok(())
}
