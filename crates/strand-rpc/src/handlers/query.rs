// crates/strand-rpc/src/handlers/query.rs
//
// query/holders: ranked holders of a content hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strand_core::error::StrandError;
use strand_core::ids::{Address, ContentHash, NodeId};

use crate::services::NodeServices;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldersRequest {
    pub hash: ContentHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderView {
    pub node_id: NodeId,
    pub trust: f64,
    pub last_verified: DateTime<Utc>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldersResponse {
    /// Whether this node stores the content itself.
    pub local: bool,
    /// Holders, most trusted first.
    pub nodes: Vec<HolderView>,
    pub message: String,
}

/// Handle a query/holders request. An unknown hash is an empty answer.
pub async fn handle_holders(
    services: &NodeServices,
    request: HoldersRequest,
) -> Result<HoldersResponse, StrandError> {
    let local = services.content.contains(&request.hash).await?;
    let nodes: Vec<HolderView> = services
        .query
        .resolve_detailed(&request.hash)
        .await
        .into_iter()
        .map(|e| HolderView {
            node_id: e.node,
            trust: e.trust,
            last_verified: e.last_verified,
            address: e.address,
        })
        .collect();

    let message = if nodes.is_empty() {
        format!("No known holders of {}", request.hash.short())
    } else {
        format!("{} holder(s) of {}", nodes.len(), request.hash.short())
    };

    Ok(HoldersResponse {
        local,
        nodes,
        message,
    })
}
