// crates/strand-registry/src/pool.rs
//
// Pool table: one replica group per content hash, membership drawn from the
// registry's eligible holders. Pools store NodeIds only, so trust and
// addresses are always read back through the registry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use strand_core::error::StrandError;
use strand_core::ids::{Address, ContentHash, NodeId};
use strand_core::pool::Pool;

use crate::registry::LocationRegistry;

/// One pool member as the registry currently sees it.
///
/// `trust` is `None` when the member has no entry any more (evicted or never
/// verified); callers should treat such members as currently unverified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberView {
    pub node: NodeId,
    pub trust: Option<f64>,
    pub last_verified: Option<DateTime<Utc>>,
    pub address: Option<Address>,
}

impl MemberView {
    pub fn is_verified(&self) -> bool {
        self.trust.is_some()
    }
}

/// Pools and the hash index over them, kept under one lock so a hash never
/// maps to more than one pool.
#[derive(Default)]
struct PoolTable {
    pools: HashMap<Uuid, Pool>,
    by_hash: HashMap<ContentHash, Uuid>,
}

pub struct PoolManager {
    registry: Arc<LocationRegistry>,
    table: RwLock<PoolTable>,
}

impl PoolManager {
    pub fn new(registry: Arc<LocationRegistry>) -> Self {
        Self {
            registry,
            table: RwLock::new(PoolTable::default()),
        }
    }

    pub fn registry(&self) -> &Arc<LocationRegistry> {
        &self.registry
    }

    /// Holders of `hash` at or above the participation floor, in rank order.
    async fn eligible_members(&self, hash: &ContentHash) -> Vec<NodeId> {
        let policy = self.registry.policy();
        self.registry
            .holders(hash)
            .await
            .iter()
            .filter(|e| policy.is_eligible(e.trust))
            .map(|e| e.node)
            .collect()
    }

    /// Form the pool for `hash` from its eligible holders.
    ///
    /// If a pool already exists for the hash, its membership is recomputed and
    /// the same pool identity is returned.
    pub async fn create_pool(&self, hash: &ContentHash) -> Result<Pool, StrandError> {
        let members = self.eligible_members(hash).await;
        if members.is_empty() {
            return Err(StrandError::NoEligibleHolders(format!(
                "no holder of {} meets the participation threshold",
                hash
            )));
        }

        let now = Utc::now();
        let mut table = self.table.write().await;
        let existing = table.by_hash.get(hash).and_then(|id| table.pools.get(id));
        let pool = match existing {
            Some(current) => current.with_members(members, now),
            None => Pool::new(*hash, members, now),
        };
        table.by_hash.insert(*hash, pool.id);
        table.pools.insert(pool.id, pool.clone());
        drop(table);

        tracing::info!(
            "Pool {} for {} has {} members",
            pool.id,
            hash.short(),
            pool.members.len()
        );
        Ok(pool)
    }

    /// Recompute membership of an existing pool, keeping its identity.
    ///
    /// The refreshed pool may be empty if every member has fallen below the
    /// participation floor or been evicted.
    pub async fn refresh_pool(&self, pool: &Pool) -> Result<Pool, StrandError> {
        let members = self.eligible_members(&pool.hash).await;
        let refreshed = pool.with_members(members, Utc::now());

        let mut table = self.table.write().await;
        if !table.pools.contains_key(&pool.id) {
            return Err(StrandError::NotFound(format!("pool {}", pool.id)));
        }
        table.pools.insert(refreshed.id, refreshed.clone());
        tracing::debug!(
            "Refreshed pool {}: {} -> {} members",
            pool.id,
            pool.members.len(),
            refreshed.members.len()
        );
        Ok(refreshed)
    }

    pub async fn refresh_by_id(&self, id: &Uuid) -> Result<Pool, StrandError> {
        let pool = self
            .get(id)
            .await
            .ok_or_else(|| StrandError::NotFound(format!("pool {}", id)))?;
        self.refresh_pool(&pool).await
    }

    pub async fn get(&self, id: &Uuid) -> Option<Pool> {
        self.table.read().await.pools.get(id).cloned()
    }

    /// All pools, oldest first.
    pub async fn list(&self) -> Vec<Pool> {
        let mut pools: Vec<Pool> = self.table.read().await.pools.values().cloned().collect();
        pools.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        pools
    }

    /// The pool formed for `hash`, if any.
    pub async fn pools_for(&self, hash: &ContentHash) -> Option<Pool> {
        let table = self.table.read().await;
        let id = table.by_hash.get(hash)?;
        table.pools.get(id).cloned()
    }

    /// Resolve each member against the registry's current view.
    pub async fn resolve_members(&self, pool: &Pool) -> Vec<MemberView> {
        let holders = self.registry.holders(&pool.hash).await;
        pool.members
            .iter()
            .map(|node| match holders.iter().find(|e| e.node == *node) {
                Some(entry) => MemberView {
                    node: *node,
                    trust: Some(entry.trust),
                    last_verified: Some(entry.last_verified),
                    address: entry.address.clone(),
                },
                None => MemberView {
                    node: *node,
                    trust: None,
                    last_verified: None,
                    address: None,
                },
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.pools.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::probe::ProbeOutcome;
    use strand_trust::TrustPolicy;

    fn node(id: u8) -> NodeId {
        NodeId::from_bytes([id; 32])
    }

    fn setup() -> (Arc<LocationRegistry>, PoolManager) {
        let registry = Arc::new(LocationRegistry::new(TrustPolicy::default()));
        let pools = PoolManager::new(registry.clone());
        (registry, pools)
    }

    async fn drive_down(registry: &LocationRegistry, hash: &ContentHash, who: NodeId, times: usize) {
        for _ in 0..times {
            registry
                .apply_probe_outcome(hash, &who, ProbeOutcome::Mismatch, None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_pool_without_holders_fails() {
        let (_, pools) = setup();
        let err = pools
            .create_pool(&ContentHash::of(b"unknown"))
            .await
            .unwrap_err();
        assert!(matches!(err, StrandError::NoEligibleHolders(_)));
        assert!(pools.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_pool_excludes_low_trust_holders() {
        let (registry, pools) = setup();
        let hash = ContentHash::of(b"content");
        registry.record_holder(&hash, &node(1), None).await.unwrap();
        registry.record_holder(&hash, &node(2), None).await.unwrap();
        // 0.5 * 0.4^3 = 0.032, under the 0.1 floor
        drive_down(&registry, &hash, node(2), 3).await;

        let pool = pools.create_pool(&hash).await.unwrap();
        assert_eq!(pool.members, vec![node(1)]);
        assert_eq!(pools.pools_for(&hash).await.unwrap().id, pool.id);
    }

    #[tokio::test]
    async fn test_create_pool_twice_keeps_identity() {
        let (registry, pools) = setup();
        let hash = ContentHash::of(b"content");
        registry.record_holder(&hash, &node(1), None).await.unwrap();
        let first = pools.create_pool(&hash).await.unwrap();

        registry.record_holder(&hash, &node(2), None).await.unwrap();
        let second = pools.create_pool(&hash).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.members.len(), 2);
        assert_eq!(pools.len().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_drops_members_and_may_empty() {
        let (registry, pools) = setup();
        let hash = ContentHash::of(b"content");
        registry.record_holder(&hash, &node(1), None).await.unwrap();
        let pool = pools.create_pool(&hash).await.unwrap();

        drive_down(&registry, &hash, node(1), 3).await;
        let refreshed = pools.refresh_pool(&pool).await.unwrap();
        assert_eq!(refreshed.id, pool.id);
        assert_eq!(refreshed.created_at, pool.created_at);
        assert!(refreshed.members.is_empty());
        assert!(refreshed.refreshed_at >= pool.refreshed_at);
    }

    #[tokio::test]
    async fn test_refresh_unknown_pool_is_not_found() {
        let (_, pools) = setup();
        let err = pools.refresh_by_id(&Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, StrandError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_evicted_member_resolves_unverified() {
        let (registry, pools) = setup();
        let hash = ContentHash::of(b"content");
        registry.record_holder(&hash, &node(1), None).await.unwrap();
        registry.record_holder(&hash, &node(2), None).await.unwrap();
        let pool = pools.create_pool(&hash).await.unwrap();

        drive_down(&registry, &hash, node(2), 5).await;
        assert!(registry.entry(&hash, &node(2)).await.is_none());

        let views = pools.resolve_members(&pool).await;
        let gone = views.iter().find(|v| v.node == node(2)).unwrap();
        assert!(!gone.is_verified());
        let kept = views.iter().find(|v| v.node == node(1)).unwrap();
        assert_eq!(kept.trust, Some(0.5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_creates_share_one_pool() {
        let (registry, pools) = setup();
        let pools = Arc::new(pools);
        let hash = ContentHash::of(b"contended");
        registry.record_holder(&hash, &node(1), None).await.unwrap();

        for _ in 0..50 {
            let mut tasks = tokio::task::JoinSet::new();
            for _ in 0..32 {
                let pools = pools.clone();
                tasks.spawn(async move { pools.create_pool(&hash).await.unwrap().id });
            }
            let mut ids = Vec::new();
            while let Some(id) = tasks.join_next().await {
                ids.push(id.unwrap());
            }
            assert_eq!(pools.len().await, 1);
            let expected = pools.pools_for(&hash).await.unwrap().id;
            assert!(ids.iter().all(|id| *id == expected));
        }
    }
}
