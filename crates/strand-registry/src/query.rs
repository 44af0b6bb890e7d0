// crates/strand-registry/src/query.rs
//
// Read side of the registry: ranked holder lists and peer selection.

use std::sync::Arc;

use strand_core::ids::{Address, ContentHash, NodeId};
use strand_core::location::LocationEntry;

use crate::registry::LocationRegistry;

#[derive(Clone)]
pub struct QueryResolver {
    registry: Arc<LocationRegistry>,
}

impl QueryResolver {
    pub fn new(registry: Arc<LocationRegistry>) -> Self {
        Self { registry }
    }

    /// Holders of `hash` ranked by trust desc, recency desc, NodeId asc.
    pub async fn resolve(&self, hash: &ContentHash) -> Vec<(NodeId, f64)> {
        self.registry.lookup(hash).await
    }

    /// Same ranking with full entries (addresses, failure counts, timestamps).
    pub async fn resolve_detailed(&self, hash: &ContentHash) -> Vec<LocationEntry> {
        self.registry.holders(hash).await.to_vec()
    }

    /// Highest-ranked holder other than `exclude` with a known address and
    /// trust above the participation floor.
    pub async fn best_peer(
        &self,
        hash: &ContentHash,
        exclude: Option<&NodeId>,
    ) -> Option<(NodeId, Address, f64)> {
        let policy = self.registry.policy();
        self.registry
            .holders(hash)
            .await
            .iter()
            .filter(|e| exclude != Some(&e.node))
            .filter(|e| policy.is_eligible(e.trust))
            .find_map(|e| e.address.clone().map(|addr| (e.node, addr, e.trust)))
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

    fn addr(port: u16) -> Address {
        Address::parse(&format!("http://127.0.0.1:{}", port)).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_is_deterministic() {
        let registry = Arc::new(LocationRegistry::new(TrustPolicy::default()));
        let resolver = QueryResolver::new(registry.clone());
        let hash = ContentHash::of(b"q");
        for id in [9, 3, 7] {
            registry.record_holder(&hash, &node(id), None).await.unwrap();
        }

        let first = resolver.resolve(&hash).await;
        let second = resolver.resolve(&hash).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(resolver.resolve(&ContentHash::of(b"other")).await.is_empty());
    }

    #[tokio::test]
    async fn test_best_peer_skips_self_and_addressless() {
        let registry = Arc::new(LocationRegistry::new(TrustPolicy::default()));
        let resolver = QueryResolver::new(registry.clone());
        let hash = ContentHash::of(b"q");

        registry
            .record_holder(&hash, &node(1), Some(addr(1)))
            .await
            .unwrap();
        registry.record_holder(&hash, &node(2), None).await.unwrap();
        registry
            .record_holder(&hash, &node(3), Some(addr(3)))
            .await
            .unwrap();
        for who in [1, 2] {
            registry
                .apply_probe_outcome(&hash, &node(who), ProbeOutcome::Success, None)
                .await
                .unwrap();
        }

        let (best, address, _) = resolver.best_peer(&hash, Some(&node(1))).await.unwrap();
        assert_eq!(best, node(3));
        assert_eq!(address, addr(3));

        let (best, _, trust) = resolver.best_peer(&hash, None).await.unwrap();
        assert_eq!(best, node(1));
        assert!(trust > 0.5);
    }
}
