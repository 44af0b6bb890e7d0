// crates/strand-cli/src/commands/query.rs
//
// `strand query <hash>`: list holders ranked by trust.

use clap::Args;
use tabled::Tabled;

use strand_core::ids::ContentHash;
use strand_rpc::handlers::query::{HolderView, HoldersRequest, HoldersResponse};

use crate::output::{format_address, format_json, format_table, format_trust, OutputFormat};
use crate::rpc_client::RpcClient;

#[derive(Debug, Args)]
pub struct QueryCmd {
    /// Content hash (64 hex chars).
    #[arg()]
    pub hash: ContentHash,
}

#[derive(Tabled)]
struct HolderRow {
    #[tabled(rename = "NODE")]
    node: String,
    #[tabled(rename = "TRUST")]
    trust: String,
    #[tabled(rename = "LAST VERIFIED")]
    last_verified: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
}

impl From<&HolderView> for HolderRow {
    fn from(h: &HolderView) -> Self {
        Self {
            node: h.node_id.short(),
            trust: format_trust(Some(h.trust)),
            last_verified: h.last_verified.format("%Y-%m-%d %H:%M:%S").to_string(),
            address: format_address(h.address.as_ref()),
        }
    }
}

/// Run the query command.
pub async fn run(
    client: &RpcClient,
    cmd: &QueryCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let resp: HoldersResponse = client
        .call("query/holders", &HoldersRequest { hash: cmd.hash })
        .await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&resp));
        return Ok(());
    }

    if resp.nodes.is_empty() {
        println!("{}", resp.message);
        return Ok(());
    }
    let rows: Vec<HolderRow> = resp.nodes.iter().map(HolderRow::from).collect();
    println!("{}", format_table(&rows));
    if resp.local {
        println!("This node holds the content locally.");
    }
    Ok(())
}
