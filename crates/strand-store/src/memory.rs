// crates/strand-store/src/memory.rs
//
// In-memory `RegistryStore` and `ContentStore` implementations. Used by tests
// and by nodes started without a data directory.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use strand_core::error::StrandError;
use strand_core::ids::{ContentHash, NodeId};
use strand_core::location::LocationEntry;
use strand_core::traits::{ContentStore, RegistryStore};

/// Registry persistence held in a map.
#[derive(Debug, Default)]
pub struct MemoryRegistryStore {
    entries: RwLock<BTreeMap<(ContentHash, NodeId), LocationEntry>>,
}

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn get(&self, hash: &ContentHash, node: &NodeId) -> Option<LocationEntry> {
        self.entries.read().await.get(&(*hash, *node)).cloned()
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistryStore {
    async fn upsert_entry(
        &self,
        hash: &ContentHash,
        entry: &LocationEntry,
    ) -> Result<(), StrandError> {
        self.entries
            .write()
            .await
            .insert((*hash, entry.node), entry.clone());
        Ok(())
    }

    async fn remove_entry(&self, hash: &ContentHash, node: &NodeId) -> Result<(), StrandError> {
        self.entries.write().await.remove(&(*hash, *node));
        Ok(())
    }

    async fn load_entries(&self) -> Result<Vec<(ContentHash, LocationEntry)>, StrandError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .map(|((hash, _), entry)| (*hash, entry.clone()))
            .collect())
    }
}

/// Blob storage held in a map.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<ContentHash, Vec<u8>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes under an arbitrary hash, bypassing the digest.
    ///
    /// Lets tests stand up a peer that serves corrupted content.
    pub async fn insert_unchecked(&self, hash: ContentHash, data: Vec<u8>) {
        self.blobs.write().await.insert(hash, data);
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StrandError> {
        let hash = ContentHash::of(data);
        self.blobs
            .write()
            .await
            .entry(hash)
            .or_insert_with(|| data.to_vec());
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>, StrandError> {
        Ok(self.blobs.read().await.get(hash).cloned())
    }

    async fn contains(&self, hash: &ContentHash) -> Result<bool, StrandError> {
        Ok(self.blobs.read().await.contains_key(hash))
    }

    async fn list(&self) -> Result<Vec<(ContentHash, u64)>, StrandError> {
        let mut out: Vec<_> = self
            .blobs
            .read()
            .await
            .iter()
            .map(|(hash, data)| (*hash, data.len() as u64))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_registry_store_upsert_overwrites() {
        let store = MemoryRegistryStore::new();
        let hash = ContentHash::of(b"a");
        let mut entry = LocationEntry::new(NodeId::from_bytes([9; 32]), 0.5, None, Utc::now());
        store.upsert_entry(&hash, &entry).await.unwrap();
        entry.trust = 0.7;
        store.upsert_entry(&hash, &entry).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&hash, &entry.node).await.unwrap().trust, 0.7);
    }

    #[tokio::test]
    async fn test_unchecked_insert_keeps_wrong_bytes() {
        let store = MemoryContentStore::new();
        let hash = ContentHash::of(b"genuine");
        store.insert_unchecked(hash, b"forged".to_vec()).await;
        let served = store.get(&hash).await.unwrap().unwrap();
        assert!(!hash.matches(&served));
    }
}
