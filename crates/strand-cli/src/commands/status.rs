// crates/strand-cli/src/commands/status.rs
//
// `strand status`: display node identity, lifecycle state and health.

use serde_json::json;

use strand_rpc::handlers::node::{GetHealthResponse, GetNodeInfoResponse};

use crate::output::{format_address, format_json, OutputFormat};
use crate::rpc_client::RpcClient;

/// Run the status command.
pub async fn run(client: &RpcClient, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let info: GetNodeInfoResponse = match client.call("node/info", &json!({})).await {
        Ok(info) => info,
        Err(e) => {
            println!("Node Status");
            println!("-----------");
            println!("  Connection:   Not connected");
            println!("  RPC endpoint: {}", client.endpoint());
            println!("  Error:        {}", e);
            return Ok(());
        }
    };
    let health: GetHealthResponse = client.call("node/health", &json!({})).await?;

    if format == OutputFormat::Json {
        println!("{}", format_json(&json!({ "info": info, "health": health })));
        return Ok(());
    }

    println!("Strand v{}", info.version);
    println!();
    println!("Node Status");
    println!("-----------");
    println!("  Connection:   Connected");
    println!("  RPC endpoint: {}", client.endpoint());
    println!("  Node ID:      {}", info.node_id);
    println!("  Address:      {}", format_address(info.address.as_ref()));
    println!("  State:        {}", info.state);
    println!("  Uptime:       {}s", info.uptime_seconds);
    println!("  Health:       {} (ready: {})", health.status, health.ready);
    println!("  Hashes:       {}", info.tracked_hashes);
    println!("  Entries:      {}", info.location_entries);
    println!("  Pools:        {}", info.pools);
    println!("  Local blobs:  {}", info.local_content);
    if let Some(details) = health.details {
        println!("  Details:      {}", details);
    }

    Ok(())
}
