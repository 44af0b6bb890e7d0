// crates/strand-registry/src/intake.rs
//
// Share Intake: the local node announces itself as a holder of content it has
// just stored, optionally forming a pool in the same step.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use strand_core::error::StrandError;
use strand_core::ids::{Address, ContentHash, NodeId};
use strand_core::pool::Pool;

use crate::pool::PoolManager;
use crate::registry::LocationRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareOutcome {
    pub hash: ContentHash,
    /// False when the local node was already a recorded holder.
    pub created: bool,
    pub pool: Option<Pool>,
}

pub struct ShareIntake {
    registry: Arc<LocationRegistry>,
    pools: Arc<PoolManager>,
    self_id: NodeId,
    local_address: Option<Address>,
}

impl ShareIntake {
    pub fn new(
        registry: Arc<LocationRegistry>,
        pools: Arc<PoolManager>,
        self_id: NodeId,
        local_address: Option<Address>,
    ) -> Self {
        Self {
            registry,
            pools,
            self_id,
            local_address,
        }
    }

    pub fn self_id(&self) -> &NodeId {
        &self.self_id
    }

    /// Record the local node as a holder of `hash`. Re-sharing keeps the
    /// existing entry and its trust.
    pub async fn share(
        &self,
        hash: &ContentHash,
        create_pool: bool,
    ) -> Result<ShareOutcome, StrandError> {
        let created = self
            .registry
            .record_holder(hash, &self.self_id, self.local_address.clone())
            .await?;

        let pool = if create_pool {
            Some(self.pools.create_pool(hash).await?)
        } else {
            None
        };

        tracing::info!(
            "Shared {} (new holder: {}, pool: {})",
            hash.short(),
            created,
            pool.as_ref().map(|p| p.id.to_string()).unwrap_or_else(|| "-".into())
        );
        Ok(ShareOutcome {
            hash: *hash,
            created,
            pool,
        })
    }
}
