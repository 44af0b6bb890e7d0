// crates/strand-rpc/src/handlers/node.rs
//
// Node info and health handlers: GetNodeInfo, GetHealth.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use strand_core::error::StrandError;
use strand_core::ids::{Address, NodeId};

use crate::services::NodeServices;

// ---------------------------------------------------------------------------
// node/info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNodeInfoRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNodeInfoResponse {
    pub node_id: NodeId,
    pub address: Option<Address>,
    pub version: String,
    pub uptime_seconds: u64,
    /// Lifecycle state (e.g. "Running").
    pub state: String,
    /// Content hashes with at least one known holder.
    pub tracked_hashes: usize,
    /// Location entries across all hashes.
    pub location_entries: usize,
    pub pools: usize,
    /// Blobs stored on this node.
    pub local_content: usize,
}

pub async fn handle_get_node_info(
    services: &NodeServices,
    _request: GetNodeInfoRequest,
    start_time: Option<Instant>,
    state: String,
) -> Result<GetNodeInfoResponse, StrandError> {
    Ok(GetNodeInfoResponse {
        node_id: services.self_id(),
        address: services.self_address.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0),
        state,
        tracked_hashes: services.registry.hashes().await.len(),
        location_entries: services.registry.len().await,
        pools: services.pools.len().await,
        local_content: services.content.list().await?.len(),
    })
}

// ---------------------------------------------------------------------------
// node/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthResponse {
    /// "healthy" when serving normally, "degraded" otherwise.
    pub status: String,
    /// The process is up and answering.
    pub live: bool,
    /// The node has finished start-up and is not shutting down.
    pub ready: bool,
    pub storage_ok: bool,
    pub state: String,
    pub details: Option<String>,
}

pub async fn handle_get_health(
    services: &NodeServices,
    _request: GetHealthRequest,
    state: String,
) -> Result<GetHealthResponse, StrandError> {
    let ready = state == "Running";
    let (storage_ok, details) = match services.content.list().await {
        Ok(_) => (true, None),
        Err(e) => (false, Some(format!("content store: {}", e))),
    };

    Ok(GetHealthResponse {
        status: if ready && storage_ok { "healthy" } else { "degraded" }.to_string(),
        live: true,
        ready,
        storage_ok,
        state,
        details,
    })
}
