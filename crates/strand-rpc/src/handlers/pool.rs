// crates/strand-rpc/src/handlers/pool.rs
//
// Pool handlers: Create, List, Refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use strand_core::error::StrandError;
use strand_core::ids::ContentHash;
use strand_core::pool::Pool;
use strand_registry::MemberView;

use crate::services::NodeServices;

/// A pool with each member resolved against the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolView {
    pub pool_id: Uuid,
    pub hash: ContentHash,
    pub members: Vec<MemberView>,
    pub created_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
}

impl PoolView {
    pub async fn resolve(services: &NodeServices, pool: &Pool) -> Self {
        Self {
            pool_id: pool.id,
            hash: pool.hash,
            members: services.pools.resolve_members(pool).await,
            created_at: pool.created_at,
            refreshed_at: pool.refreshed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// pool/create
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePoolRequest {
    pub hash: ContentHash,
}

pub async fn handle_create_pool(
    services: &NodeServices,
    request: CreatePoolRequest,
) -> Result<PoolView, StrandError> {
    let pool = services.pools.create_pool(&request.hash).await?;
    Ok(PoolView::resolve(services, &pool).await)
}

// ---------------------------------------------------------------------------
// pool/list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPoolsRequest {
    /// Only the pool for this hash.
    #[serde(default)]
    pub hash: Option<ContentHash>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPoolsResponse {
    pub pools: Vec<PoolView>,
}

pub async fn handle_list_pools(
    services: &NodeServices,
    request: ListPoolsRequest,
) -> Result<ListPoolsResponse, StrandError> {
    let pools = match request.hash {
        Some(hash) => services.pools.pools_for(&hash).await.into_iter().collect(),
        None => services.pools.list().await,
    };

    let mut views = Vec::with_capacity(pools.len());
    for pool in &pools {
        views.push(PoolView::resolve(services, pool).await);
    }
    Ok(ListPoolsResponse { pools: views })
}

// ---------------------------------------------------------------------------
// pool/refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshPoolRequest {
    pub pool_id: Uuid,
}

pub async fn handle_refresh_pool(
    services: &NodeServices,
    request: RefreshPoolRequest,
) -> Result<PoolView, StrandError> {
    let pool = services.pools.refresh_by_id(&request.pool_id).await?;
    Ok(PoolView::resolve(services, &pool).await)
}
