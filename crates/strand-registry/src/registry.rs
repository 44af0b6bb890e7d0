// crates/strand-registry/src/registry.rs
//
// LocationRegistry: ContentHash -> { NodeId -> LocationEntry }.
//
// Layout:
//   shards:   RwLock<HashMap<ContentHash, Arc<Shard>>>   (taken briefly, to find a shard)
//   Shard:    Mutex<BTreeMap<NodeId, LocationEntry>>      (serialises mutations per hash)
//             RwLock<Arc<[LocationEntry]>>                (ranked snapshot for readers)
//
// Every mutation runs its read-modify-write under the shard mutex, persists
// through the optional RegistryStore, then publishes a fresh ranked snapshot.
// Readers only clone the published Arc, so they never wait on a writer's
// persistence and never see a half-applied update. No network I/O happens
// while any of these locks is held.
//
// Writers reach a shard only by cloning its Arc out of the map. A shard is
// removed once it is empty and the map holds the only Arc, checked under the
// map write lock, so no writer can mutate a shard after it is detached.
// Readers copy the snapshot under the map read lock and never clone the Arc.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use strand_core::error::StrandError;
use strand_core::ids::{Address, ContentHash, NodeId};
use strand_core::location::LocationEntry;
use strand_core::probe::ProbeOutcome;
use strand_core::traits::RegistryStore;
use strand_trust::{update, TrustPolicy};

use crate::ranking::rank;

/// Effect of one probe outcome on the registry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrustUpdate {
    /// The entry exists (or was just created by a success) with new trust.
    Updated {
        previous: f64,
        current: f64,
        created: bool,
    },
    /// Consecutive failures reached the eviction threshold; the entry is gone.
    Evicted { previous: f64 },
    /// A failure against a pair with no entry. Nothing was recorded.
    Untracked,
}

impl TrustUpdate {
    /// Trust after the update, if the entry still exists.
    pub fn trust(&self) -> Option<f64> {
        match self {
            TrustUpdate::Updated { current, .. } => Some(*current),
            _ => None,
        }
    }

    /// Whether registry state changed.
    pub fn changed(&self) -> bool {
        !matches!(self, TrustUpdate::Untracked)
    }

    pub fn is_evicted(&self) -> bool {
        matches!(self, TrustUpdate::Evicted { .. })
    }
}

/// Holders of one content hash.
#[derive(Debug)]
struct Shard {
    entries: Mutex<BTreeMap<NodeId, LocationEntry>>,
    snapshot: RwLock<Arc<[LocationEntry]>>,
}

impl Shard {
    fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            snapshot: RwLock::new(Arc::from(Vec::new())),
        }
    }

    fn from_entries(entries: BTreeMap<NodeId, LocationEntry>) -> Self {
        let snapshot = ranked(&entries);
        Self {
            entries: Mutex::new(entries),
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Publish the ranked view of `entries`. Called with the entries lock held.
    async fn publish(&self, entries: &BTreeMap<NodeId, LocationEntry>) {
        *self.snapshot.write().await = ranked(entries);
    }

    async fn read(&self) -> Arc<[LocationEntry]> {
        self.snapshot.read().await.clone()
    }
}

fn ranked(entries: &BTreeMap<NodeId, LocationEntry>) -> Arc<[LocationEntry]> {
    let mut holders: Vec<LocationEntry> = entries.values().cloned().collect();
    rank(&mut holders);
    Arc::from(holders)
}

/// In-memory index of content holders with trust scores.
pub struct LocationRegistry {
    policy: TrustPolicy,
    shards: RwLock<HashMap<ContentHash, Arc<Shard>>>,
    store: Option<Arc<dyn RegistryStore>>,
}

impl std::fmt::Debug for LocationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationRegistry")
            .field("policy", &self.policy)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl LocationRegistry {
    /// Create an empty, memory-only registry.
    pub fn new(policy: TrustPolicy) -> Self {
        Self {
            policy,
            shards: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    /// Rebuild a registry from a store and keep writing through to it.
    ///
    /// Entries whose trust is outside [0, 1] are dropped with an error log.
    pub async fn restore(
        policy: TrustPolicy,
        store: Arc<dyn RegistryStore>,
    ) -> Result<Self, StrandError> {
        let loaded = store.load_entries().await?;
        let mut grouped: HashMap<ContentHash, BTreeMap<NodeId, LocationEntry>> = HashMap::new();
        let mut dropped = 0usize;
        for (hash, entry) in loaded {
            if !entry.trust_in_bounds() {
                tracing::error!(
                    "Dropping persisted entry {}@{} with invalid trust {}",
                    entry.node.short(),
                    hash.short(),
                    entry.trust
                );
                dropped += 1;
                continue;
            }
            grouped.entry(hash).or_default().insert(entry.node, entry);
        }

        let shards: HashMap<ContentHash, Arc<Shard>> = grouped
            .into_iter()
            .map(|(hash, entries)| (hash, Arc::new(Shard::from_entries(entries))))
            .collect();
        tracing::info!(
            "Restored registry: {} hashes ({} invalid entries dropped)",
            shards.len(),
            dropped
        );

        Ok(Self {
            policy,
            shards: RwLock::new(shards),
            store: Some(store),
        })
    }

    /// Attach a store for write-through persistence. Existing state is not copied.
    pub fn with_store(mut self, store: Arc<dyn RegistryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    async fn shard(&self, hash: &ContentHash) -> Option<Arc<Shard>> {
        self.shards.read().await.get(hash).cloned()
    }

    async fn shard_or_insert(&self, hash: &ContentHash) -> Arc<Shard> {
        if let Some(shard) = self.shard(hash).await {
            return shard;
        }
        self.shards
            .write()
            .await
            .entry(*hash)
            .or_insert_with(|| Arc::new(Shard::new()))
            .clone()
    }

    /// Drop the shard for `hash` if it is empty and no task holds it.
    async fn prune_if_empty(&self, hash: &ContentHash) {
        let mut shards = self.shards.write().await;
        let Some(shard) = shards.get(hash) else {
            return;
        };
        if Arc::strong_count(shard) > 1 {
            return;
        }
        let empty = match shard.entries.try_lock() {
            Ok(entries) => entries.is_empty(),
            Err(_) => false,
        };
        if empty {
            shards.remove(hash);
            tracing::debug!("Dropped empty shard for {}", hash.short());
        }
    }

    /// Release `shard` and prune it if the last operation left it empty.
    async fn release(&self, hash: &ContentHash, shard: Arc<Shard>) {
        let empty = shard.read().await.is_empty();
        drop(shard);
        if empty {
            self.prune_if_empty(hash).await;
        }
    }

    async fn persist(&self, hash: &ContentHash, entry: &LocationEntry) -> Result<(), StrandError> {
        match &self.store {
            Some(store) => store.upsert_entry(hash, entry).await,
            None => Ok(()),
        }
    }

    async fn unpersist(&self, hash: &ContentHash, node: &NodeId) -> Result<(), StrandError> {
        match &self.store {
            Some(store) => store.remove_entry(hash, node).await,
            None => Ok(()),
        }
    }

    /// Ensure an entry exists for (hash, node).
    ///
    /// A new entry starts at the neutral prior with last-verified = now. An
    /// existing entry keeps its trust and history and only takes a supplied
    /// address. Returns `true` if the entry was created.
    pub async fn record_holder(
        &self,
        hash: &ContentHash,
        node: &NodeId,
        address: Option<Address>,
    ) -> Result<bool, StrandError> {
        let shard = self.shard_or_insert(hash).await;
        let recorded = self.record_in_shard(&shard, hash, node, address).await;
        self.release(hash, shard).await;
        recorded
    }

    async fn record_in_shard(
        &self,
        shard: &Shard,
        hash: &ContentHash,
        node: &NodeId,
        address: Option<Address>,
    ) -> Result<bool, StrandError> {
        let mut entries = shard.entries.lock().await;

        match entries.get(node) {
            Some(existing) => {
                let Some(address) = address else {
                    return Ok(false);
                };
                if existing.address.as_ref() == Some(&address) {
                    return Ok(false);
                }
                let mut updated = existing.clone();
                updated.address = Some(address);
                self.persist(hash, &updated).await?;
                entries.insert(*node, updated);
                shard.publish(&entries).await;
                Ok(false)
            }
            None => {
                let entry =
                    LocationEntry::new(*node, self.policy.neutral_prior, address, Utc::now());
                self.persist(hash, &entry).await?;
                entries.insert(*node, entry);
                shard.publish(&entries).await;
                tracing::debug!("Recorded holder {} for {}", node.short(), hash.short());
                Ok(true)
            }
        }
    }

    /// Apply one probe outcome to (hash, node).
    ///
    /// A success creates the entry if needed (starting from the neutral
    /// prior). A failure against an unknown pair records nothing. On success
    /// the failure counter resets and a supplied address is remembered; on
    /// failure the counter grows and the entry is evicted once it reaches the
    /// policy threshold.
    pub async fn apply_probe_outcome(
        &self,
        hash: &ContentHash,
        node: &NodeId,
        outcome: ProbeOutcome,
        address: Option<Address>,
    ) -> Result<TrustUpdate, StrandError> {
        let shard = match (outcome.is_success(), self.shard(hash).await) {
            (_, Some(shard)) => shard,
            (true, None) => self.shard_or_insert(hash).await,
            (false, None) => return Ok(TrustUpdate::Untracked),
        };
        let applied = self
            .apply_in_shard(&shard, hash, node, outcome, address)
            .await;
        self.release(hash, shard).await;
        applied
    }

    async fn apply_in_shard(
        &self,
        shard: &Shard,
        hash: &ContentHash,
        node: &NodeId,
        outcome: ProbeOutcome,
        address: Option<Address>,
    ) -> Result<TrustUpdate, StrandError> {
        let mut entries = shard.entries.lock().await;
        let now = Utc::now();

        let (mut entry, created) = match entries.get(node) {
            Some(existing) => (existing.clone(), false),
            None if outcome.is_success() => (
                LocationEntry::new(*node, self.policy.neutral_prior, None, now),
                true,
            ),
            None => return Ok(TrustUpdate::Untracked),
        };

        if !entry.trust_in_bounds() {
            tracing::error!(
                "Registry invariant violated: {}@{} has trust {}",
                node.short(),
                hash.short(),
                entry.trust
            );
            return Err(StrandError::InternalFault(format!(
                "trust for {} on {} is out of bounds ({})",
                node, hash, entry.trust
            )));
        }

        let previous = entry.trust;
        entry.trust = update(previous, outcome, &self.policy);
        entry.last_verified = now;
        if outcome.is_success() {
            entry.consecutive_failures = 0;
            if address.is_some() {
                entry.address = address;
            }
        } else {
            entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
        }

        if self.policy.should_evict(entry.consecutive_failures) {
            self.unpersist(hash, node).await?;
            entries.remove(node);
            shard.publish(&entries).await;
            tracing::info!(
                "Evicted {} from {} after {} consecutive failures",
                node.short(),
                hash.short(),
                entry.consecutive_failures
            );
            return Ok(TrustUpdate::Evicted { previous });
        }

        let current = entry.trust;
        self.persist(hash, &entry).await?;
        entries.insert(*node, entry);
        shard.publish(&entries).await;
        tracing::debug!(
            "Trust {}@{}: {:.4} -> {:.4} ({})",
            node.short(),
            hash.short(),
            previous,
            current,
            outcome
        );

        Ok(TrustUpdate::Updated {
            previous,
            current,
            created,
        })
    }

    /// All holders of `hash`, ranked, as (node, trust).
    ///
    /// An unknown hash yields an empty vector.
    pub async fn lookup(&self, hash: &ContentHash) -> Vec<(NodeId, f64)> {
        self.holders(hash)
            .await
            .iter()
            .map(|e| (e.node, e.trust))
            .collect()
    }

    /// Ranked point-in-time snapshot of the full entries for `hash`.
    pub async fn holders(&self, hash: &ContentHash) -> Arc<[LocationEntry]> {
        let shards = self.shards.read().await;
        match shards.get(hash) {
            Some(shard) => shard.read().await,
            None => Arc::from(Vec::new()),
        }
    }

    /// Copy of the entry for (hash, node), if any.
    pub async fn entry(&self, hash: &ContentHash, node: &NodeId) -> Option<LocationEntry> {
        self.holders(hash)
            .await
            .iter()
            .find(|e| e.node == *node)
            .cloned()
    }

    /// Last known address for (hash, node).
    pub async fn address_of(&self, hash: &ContentHash, node: &NodeId) -> Option<Address> {
        self.entry(hash, node).await.and_then(|e| e.address)
    }

    /// Hashes with at least one holder, in byte order.
    pub async fn hashes(&self) -> Vec<ContentHash> {
        let shards = self.shards.read().await;
        let mut out = Vec::new();
        for (hash, shard) in shards.iter() {
            if !shard.read().await.is_empty() {
                out.push(*hash);
            }
        }
        out.sort();
        out
    }

    /// Total number of entries across all hashes.
    pub async fn len(&self) -> usize {
        let shards = self.shards.read().await;
        let mut total = 0;
        for shard in shards.values() {
            total += shard.read().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_store::MemoryRegistryStore;

    fn node(id: u8) -> NodeId {
        NodeId::from_bytes([id; 32])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_lookup_unknown_hash_is_empty() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        assert!(registry.lookup(&ContentHash::of(b"nothing")).await.is_empty());
    }

    #[tokio::test]
    async fn test_record_holder_is_idempotent() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        assert!(registry.record_holder(&hash, &node(1), None).await.unwrap());
        assert!(!registry.record_holder(&hash, &node(1), None).await.unwrap());

        let holders = registry.lookup(&hash).await;
        assert_eq!(holders, vec![(node(1), 0.5)]);
    }

    #[tokio::test]
    async fn test_record_holder_keeps_trust_but_takes_address() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        registry.record_holder(&hash, &node(1), None).await.unwrap();
        registry
            .apply_probe_outcome(&hash, &node(1), ProbeOutcome::Success, None)
            .await
            .unwrap();

        let address = Address::parse("http://10.0.0.1:50051").unwrap();
        registry
            .record_holder(&hash, &node(1), Some(address.clone()))
            .await
            .unwrap();
        // A later record without an address must not clear it.
        registry.record_holder(&hash, &node(1), None).await.unwrap();

        let entry = registry.entry(&hash, &node(1)).await.unwrap();
        assert!(approx(entry.trust, 0.6));
        assert_eq!(entry.address, Some(address));
    }

    #[tokio::test]
    async fn test_success_creates_entry_from_prior() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        let update = registry
            .apply_probe_outcome(&hash, &node(2), ProbeOutcome::Success, None)
            .await
            .unwrap();
        match update {
            TrustUpdate::Updated {
                previous,
                current,
                created,
            } => {
                assert!(approx(previous, 0.5));
                assert!(approx(current, 0.6));
                assert!(created);
            }
            other => panic!("unexpected update {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_on_unknown_pair_records_nothing() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        let update = registry
            .apply_probe_outcome(&hash, &node(2), ProbeOutcome::Unreachable, None)
            .await
            .unwrap();
        assert_eq!(update, TrustUpdate::Untracked);
        assert!(registry.lookup(&hash).await.is_empty());
    }

    #[tokio::test]
    async fn test_consecutive_failures_evict() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        registry.record_holder(&hash, &node(3), None).await.unwrap();

        let mut last = 0.5;
        for _ in 0..4 {
            let update = registry
                .apply_probe_outcome(&hash, &node(3), ProbeOutcome::Unreachable, None)
                .await
                .unwrap();
            let current = update.trust().unwrap();
            assert!(current < last && current >= 0.0);
            last = current;
        }
        let update = registry
            .apply_probe_outcome(&hash, &node(3), ProbeOutcome::Unreachable, None)
            .await
            .unwrap();
        assert!(update.is_evicted());
        assert!(registry.lookup(&hash).await.is_empty());
        assert!(registry.hashes().await.is_empty());
    }

    #[tokio::test]
    async fn test_success_resets_failure_counter() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        registry.record_holder(&hash, &node(4), None).await.unwrap();
        for _ in 0..4 {
            registry
                .apply_probe_outcome(&hash, &node(4), ProbeOutcome::Mismatch, None)
                .await
                .unwrap();
        }
        registry
            .apply_probe_outcome(&hash, &node(4), ProbeOutcome::Success, None)
            .await
            .unwrap();
        let entry = registry.entry(&hash, &node(4)).await.unwrap();
        assert_eq!(entry.consecutive_failures, 0);

        // Four more failures are still below the threshold.
        for _ in 0..4 {
            registry
                .apply_probe_outcome(&hash, &node(4), ProbeOutcome::Unreachable, None)
                .await
                .unwrap();
        }
        assert!(registry.entry(&hash, &node(4)).await.is_some());
    }

    #[tokio::test]
    async fn test_lookup_ranks_by_trust() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        for id in 1..=3 {
            registry.record_holder(&hash, &node(id), None).await.unwrap();
        }
        registry
            .apply_probe_outcome(&hash, &node(3), ProbeOutcome::Success, None)
            .await
            .unwrap();
        registry
            .apply_probe_outcome(&hash, &node(1), ProbeOutcome::Unreachable, None)
            .await
            .unwrap();

        let order: Vec<NodeId> = registry.lookup(&hash).await.iter().map(|h| h.0).collect();
        assert_eq!(order, vec![node(3), node(2), node(1)]);
    }

    #[tokio::test]
    async fn test_concurrent_outcomes_are_not_lost() {
        let registry = Arc::new(LocationRegistry::new(TrustPolicy::default()));
        let hash = ContentHash::of(b"h1");
        registry.record_holder(&hash, &node(5), None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .apply_probe_outcome(&hash, &node(5), ProbeOutcome::Success, None)
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut expected = 0.5;
        for _ in 0..32 {
            expected = update(expected, ProbeOutcome::Success, registry.policy());
        }
        let entry = registry.entry(&hash, &node(5)).await.unwrap();
        assert!(approx(entry.trust, expected));
        assert!(entry.trust < 1.0);
    }

    #[tokio::test]
    async fn test_concurrent_failures_count_every_outcome() {
        let registry = Arc::new(LocationRegistry::new(TrustPolicy::default()));
        let hash = ContentHash::of(b"h1");
        registry.record_holder(&hash, &node(6), None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .apply_probe_outcome(&hash, &node(6), ProbeOutcome::Unreachable, None)
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let entry = registry.entry(&hash, &node(6)).await.unwrap();
        assert_eq!(entry.consecutive_failures, 4);
        assert!(approx(entry.trust, 0.5 * 0.7_f64.powi(4)));
    }

    #[tokio::test]
    async fn test_write_through_and_restore() {
        let store = Arc::new(MemoryRegistryStore::new());
        let hash = ContentHash::of(b"persisted");
        {
            let registry =
                LocationRegistry::new(TrustPolicy::default()).with_store(store.clone());
            registry.record_holder(&hash, &node(1), None).await.unwrap();
            registry
                .apply_probe_outcome(&hash, &node(2), ProbeOutcome::Success, None)
                .await
                .unwrap();
            registry.record_holder(&hash, &node(3), None).await.unwrap();
            for _ in 0..5 {
                registry
                    .apply_probe_outcome(&hash, &node(3), ProbeOutcome::Unreachable, None)
                    .await
                    .unwrap();
            }
        }
        assert_eq!(store.len().await, 2);

        let restored = LocationRegistry::restore(TrustPolicy::default(), store.clone())
            .await
            .unwrap();
        let holders = restored.lookup(&hash).await;
        assert_eq!(holders.len(), 2);
        assert_eq!(holders[0].0, node(2));
        assert!(approx(holders[0].1, 0.6));
    }

    #[tokio::test]
    async fn test_restore_drops_out_of_bounds_entries() {
        let store = Arc::new(MemoryRegistryStore::new());
        let hash = ContentHash::of(b"corrupt");
        let mut bad = LocationEntry::new(node(1), 0.5, None, Utc::now());
        bad.trust = 3.0;
        store.upsert_entry(&hash, &bad).await.unwrap();
        let good = LocationEntry::new(node(2), 0.5, None, Utc::now());
        store.upsert_entry(&hash, &good).await.unwrap();

        let registry = LocationRegistry::restore(TrustPolicy::default(), store)
            .await
            .unwrap();
        assert_eq!(registry.lookup(&hash).await, vec![(node(2), 0.5)]);
    }

    #[tokio::test]
    async fn test_evicting_last_holder_drops_the_shard() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        registry.record_holder(&hash, &node(1), None).await.unwrap();
        assert_eq!(registry.shards.read().await.len(), 1);

        for _ in 0..5 {
            registry
                .apply_probe_outcome(&hash, &node(1), ProbeOutcome::Unreachable, None)
                .await
                .unwrap();
        }
        assert!(registry.shards.read().await.is_empty());
        assert!(registry.lookup(&hash).await.is_empty());

        // The hash can be tracked again afterwards.
        registry
            .apply_probe_outcome(&hash, &node(2), ProbeOutcome::Success, None)
            .await
            .unwrap();
        let holders = registry.lookup(&hash).await;
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].0, node(2));
        assert!(approx(holders[0].1, 0.6));
    }

    #[tokio::test]
    async fn test_shard_in_use_is_kept_until_released() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let hash = ContentHash::of(b"h1");
        registry.record_holder(&hash, &node(1), None).await.unwrap();

        let held = registry.shard(&hash).await.unwrap();
        for _ in 0..5 {
            registry
                .apply_probe_outcome(&hash, &node(1), ProbeOutcome::Mismatch, None)
                .await
                .unwrap();
        }
        assert_eq!(registry.shards.read().await.len(), 1);
        assert!(held.read().await.is_empty());
        drop(held);

        let outcome = registry
            .apply_probe_outcome(&hash, &node(1), ProbeOutcome::Unreachable, None)
            .await
            .unwrap();
        assert_eq!(outcome, TrustUpdate::Untracked);
        assert!(registry.shards.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_other_hashes_keep_their_shards() {
        let registry = LocationRegistry::new(TrustPolicy::default());
        let keep = ContentHash::of(b"keep");
        let drop_me = ContentHash::of(b"drop");
        registry.record_holder(&keep, &node(1), None).await.unwrap();
        registry.record_holder(&drop_me, &node(1), None).await.unwrap();
        for _ in 0..5 {
            registry
                .apply_probe_outcome(&drop_me, &node(1), ProbeOutcome::Unreachable, None)
                .await
                .unwrap();
        }
        assert_eq!(registry.hashes().await, vec![keep]);
        assert_eq!(registry.shards.read().await.len(), 1);
        assert_eq!(registry.len().await, 1);
    }
}
