// crates/strand-cli/src/commands/content.rs
//
// `strand content {list, pull}`: local content on the daemon.

use clap::Subcommand;
use serde_json::json;
use tabled::Tabled;

use strand_core::ids::ContentHash;
use strand_rpc::handlers::content::{ListContentResponse, PullRequest, PullResponse};

use crate::output::{format_json, format_table, OutputFormat};
use crate::rpc_client::RpcClient;

/// Local content subcommands.
#[derive(Debug, Subcommand)]
pub enum ContentCmd {
    /// List content stored on the daemon.
    List,
    /// Download content from the most trusted holder that serves it correctly.
    Pull {
        /// Content hash (64 hex chars).
        hash: ContentHash,
    },
}

#[derive(Tabled)]
struct ContentRow {
    #[tabled(rename = "HASH")]
    hash: String,
    #[tabled(rename = "SIZE")]
    size: u64,
}

/// Run the content subcommand.
pub async fn run(
    client: &RpcClient,
    cmd: &ContentCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ContentCmd::List => {
            let resp: ListContentResponse = client.call("content/list", &json!({})).await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&resp));
            } else if resp.items.is_empty() {
                println!("No local content.");
            } else {
                let rows: Vec<ContentRow> = resp
                    .items
                    .iter()
                    .map(|c| ContentRow {
                        hash: c.hash.to_hex(),
                        size: c.size,
                    })
                    .collect();
                println!("{}", format_table(&rows));
            }
        }
        ContentCmd::Pull { hash } => {
            let resp: PullResponse = client
                .call("content/pull", &PullRequest { hash: *hash })
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&resp));
                return Ok(());
            }
            match resp.source {
                Some(source) => println!(
                    "Pulled {} ({} bytes) from {} after {} attempt(s)",
                    resp.hash.short(),
                    resp.size,
                    source.short(),
                    resp.attempts
                ),
                None => println!("{} is already stored locally", resp.hash.short()),
            }
        }
    }
    Ok(())
}
