// crates/strand-rpc/src/handlers/content.rs
//
// Content handlers: Share, Fetch (peer-facing), List, Pull.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use strand_core::error::StrandError;
use strand_core::ids::{ContentHash, NodeId};
use strand_core::wire::{FetchRequest, FetchResponse};

use crate::handlers::pool::PoolView;
use crate::services::NodeServices;

// ---------------------------------------------------------------------------
// content/share
// ---------------------------------------------------------------------------

/// Share a file from the daemon's filesystem or inline bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Path under the daemon's configured share root.
    #[serde(default)]
    pub path: Option<String>,
    /// Inline content, hex-encoded.
    #[serde(default)]
    pub data_hex: Option<String>,
    /// Also form a pool for the content.
    #[serde(default)]
    pub create_pool: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub hash: ContentHash,
    pub size: u64,
    /// False if this node was already a recorded holder.
    pub newly_recorded: bool,
    pub pool: Option<PoolView>,
}

pub async fn handle_share(
    services: &NodeServices,
    request: ShareRequest,
) -> Result<ShareResponse, StrandError> {
    let data = match (request.path, request.data_hex) {
        (Some(path), None) => {
            let path = resolve_share_path(services.share_root.as_deref(), Path::new(&path)).await?;
            tokio::fs::read(&path).await.map_err(|e| {
                StrandError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
            })?
        }
        (None, Some(data_hex)) => hex::decode(data_hex.trim())
            .map_err(|e| StrandError::InvalidInput(format!("data_hex is not valid hex: {}", e)))?,
        _ => {
            return Err(StrandError::InvalidInput(
                "exactly one of path or data_hex is required".to_string(),
            ))
        }
    };

    let hash = services.content.put(&data).await?;
    let outcome = services.intake.share(&hash, request.create_pool).await?;
    let pool = match outcome.pool {
        Some(pool) => Some(PoolView::resolve(services, &pool).await),
        None => None,
    };

    Ok(ShareResponse {
        hash,
        size: data.len() as u64,
        newly_recorded: outcome.created,
        pool,
    })
}

/// Canonicalize `path` and require it to lie under `root`.
///
/// Symlinks and `..` are resolved before the prefix check, so neither can
/// escape the root.
async fn resolve_share_path(root: Option<&Path>, path: &Path) -> Result<PathBuf, StrandError> {
    let root = root.ok_or_else(|| {
        StrandError::Forbidden("path shares are disabled: no share_root configured".to_string())
    })?;
    let root = tokio::fs::canonicalize(root).await.map_err(|e| {
        StrandError::Config(format!("share_root {} is unusable: {}", root.display(), e))
    })?;
    let resolved = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| StrandError::InvalidInput(format!("cannot read {}: {}", path.display(), e)))?;
    if !resolved.starts_with(&root) {
        return Err(StrandError::Forbidden(format!(
            "{} is outside the share root",
            path.display()
        )));
    }
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// content/fetch
// ---------------------------------------------------------------------------

/// Serve local content to a probing peer, signed with this node's key.
pub async fn handle_fetch(
    services: &NodeServices,
    request: FetchRequest,
) -> Result<FetchResponse, StrandError> {
    let self_id = services.self_id();
    if request.node_id != self_id {
        tracing::debug!(
            "Fetch for {} addressed to {}, answering as {}",
            request.hash.short(),
            request.node_id.short(),
            self_id.short()
        );
    }

    let data = services
        .content
        .get(&request.hash)
        .await?
        .ok_or_else(|| StrandError::NotFound(format!("content {}", request.hash)))?;
    let signature = services.keypair.attest_content(&request.hash, &data);

    Ok(FetchResponse {
        node_id: self_id,
        data_hex: hex::encode(&data),
        signature_hex: hex::encode(signature),
    })
}

// ---------------------------------------------------------------------------
// content/list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListContentRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalContent {
    pub hash: ContentHash,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListContentResponse {
    pub items: Vec<LocalContent>,
}

pub async fn handle_list(
    services: &NodeServices,
    _request: ListContentRequest,
) -> Result<ListContentResponse, StrandError> {
    let mut items: Vec<LocalContent> = services
        .content
        .list()
        .await?
        .into_iter()
        .map(|(hash, size)| LocalContent { hash, size })
        .collect();
    items.sort_by(|a, b| a.hash.cmp(&b.hash));
    Ok(ListContentResponse { items })
}

// ---------------------------------------------------------------------------
// content/pull
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub hash: ContentHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullResponse {
    pub hash: ContentHash,
    pub size: u64,
    /// Holder the bytes came from; `None` if they were already local.
    pub source: Option<NodeId>,
    /// Holders tried, including the one that succeeded.
    pub attempts: usize,
}

/// Download content from the most trusted reachable holder.
///
/// Holders are tried in rank order. Each attempt is a full probe, so failed
/// sources lose trust and the serving source gains it. The verified bytes
/// are stored locally and this node is recorded as a holder.
pub async fn handle_pull(
    services: &NodeServices,
    request: PullRequest,
) -> Result<PullResponse, StrandError> {
    let hash = request.hash;
    if let Some(data) = services.content.get(&hash).await? {
        return Ok(PullResponse {
            hash,
            size: data.len() as u64,
            source: None,
            attempts: 0,
        });
    }

    let self_id = services.self_id();
    let policy = services.registry.policy();
    let candidates: Vec<NodeId> = services
        .query
        .resolve_detailed(&hash)
        .await
        .into_iter()
        .filter(|e| e.node != self_id && e.address.is_some() && policy.is_eligible(e.trust))
        .map(|e| e.node)
        .collect();

    if candidates.is_empty() {
        return Err(StrandError::NoEligibleHolders(format!(
            "no reachable trusted holder of {}",
            hash
        )));
    }

    let mut last_error = String::new();
    for (attempt, node) in candidates.iter().enumerate() {
        let (report, data) = services.prober.retrieve(&hash, node, None).await;
        let Some(data) = data else {
            last_error = report
                .result
                .message
                .unwrap_or_else(|| report.result.outcome.to_string());
            tracing::warn!("Pull of {} from {} failed: {}", hash.short(), node.short(), last_error);
            continue;
        };

        services.content.put(&data).await?;
        services.intake.share(&hash, false).await?;
        tracing::info!(
            "Pulled {} ({} bytes) from {}",
            hash.short(),
            data.len(),
            node.short()
        );
        return Ok(PullResponse {
            hash,
            size: data.len() as u64,
            source: Some(*node),
            attempts: attempt + 1,
        });
    }

    Err(StrandError::Unreachable(format!(
        "all {} holders of {} failed, last error: {}",
        candidates.len(),
        hash,
        last_error
    )))
}
