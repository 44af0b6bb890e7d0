// crates/strand-rpc/src/handlers/probe.rs
//
// probe/run: probe one holder on demand.

use serde::{Deserialize, Serialize};

use strand_core::error::StrandError;
use strand_core::ids::{Address, ContentHash, NodeId};
use strand_core::probe::ProbeOutcome;

use crate::services::NodeServices;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub hash: ContentHash,
    pub node_id: NodeId,
    /// Overrides the address stored in the registry.
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub success: bool,
    pub outcome: ProbeOutcome,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub elapsed_ms: u64,
    pub message: String,
    pub trust_updated: bool,
    /// Trust after the update; absent if the entry was evicted or never created.
    pub trust: Option<f64>,
    pub evicted: bool,
}

/// Handle a probe/run request.
///
/// A failed probe is still a successful RPC: the verdict is in the body.
pub async fn handle_probe(
    services: &NodeServices,
    request: ProbeRequest,
) -> Result<ProbeResponse, StrandError> {
    let report = services
        .prober
        .probe(&request.hash, &request.node_id, request.address)
        .await;

    let message = match &report.result.message {
        Some(message) => message.clone(),
        None if report.result.is_success() => "content verified".to_string(),
        None => report.result.outcome.to_string(),
    };

    Ok(ProbeResponse {
        success: report.result.is_success(),
        outcome: report.result.outcome,
        bytes_read: report.result.bytes_read,
        bytes_written: report.result.bytes_written,
        elapsed_ms: report.result.elapsed.as_millis() as u64,
        message,
        trust_updated: report.trust_updated(),
        trust: report.trust(),
        evicted: report.evicted(),
    })
}
