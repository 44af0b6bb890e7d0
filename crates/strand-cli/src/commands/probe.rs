// crates/strand-cli/src/commands/probe.rs
//
// `strand probe <hash> <node>`: ask the daemon to probe one peer.

use clap::Args;

use strand_core::ids::{Address, ContentHash, NodeId};
use strand_rpc::handlers::probe::{ProbeRequest, ProbeResponse};

use crate::output::{format_json, format_trust, OutputFormat};
use crate::rpc_client::RpcClient;

#[derive(Debug, Args)]
pub struct ProbeCmd {
    /// Content hash (64 hex chars).
    #[arg()]
    pub hash: ContentHash,

    /// Node ID of the peer (64 hex chars).
    #[arg()]
    pub node: NodeId,

    /// Peer RPC address; defaults to the one the daemon already knows.
    #[arg(long)]
    pub address: Option<Address>,
}

/// Run the probe command.
pub async fn run(
    client: &RpcClient,
    cmd: &ProbeCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ProbeRequest {
        hash: cmd.hash,
        node_id: cmd.node,
        address: cmd.address.clone(),
    };
    let resp: ProbeResponse = client.call("probe/run", &request).await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&resp));
        return Ok(());
    }

    println!("Probe {} @ {}: {:?}", cmd.hash.short(), cmd.node.short(), resp.outcome);
    println!("  Elapsed:  {} ms", resp.elapsed_ms);
    println!("  Bytes:    {} read, {} written", resp.bytes_read, resp.bytes_written);
    if !resp.message.is_empty() {
        println!("  Message:  {}", resp.message);
    }
    if resp.evicted {
        println!("  Trust:    evicted");
    } else if resp.trust_updated {
        println!("  Trust:    {}", format_trust(resp.trust));
    } else {
        println!("  Trust:    not recorded");
    }
    Ok(())
}
