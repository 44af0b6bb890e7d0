// crates/strand-store/src/rocks.rs
//
// RocksDB-backed persistent storage for registry location entries.
//
// Key format:
//   - `loc:{content_hash_hex}:{node_id_hex}` -> JSON-serialized LocationEntry
//
// All entries share the `loc:` prefix so start-up restore is a single
// prefix scan.

use async_trait::async_trait;
use rocksdb::{DBWithThreadMode, MultiThreaded, Options};

use strand_core::error::StrandError;
use strand_core::ids::{ContentHash, NodeId};
use strand_core::location::LocationEntry;
use strand_core::traits::RegistryStore;

const LOCATION_PREFIX: &str = "loc:";

/// RocksDB wrapper implementing the `RegistryStore` trait.
#[derive(Debug)]
pub struct RocksRegistryStore {
    db: DBWithThreadMode<MultiThreaded>,
}

impl RocksRegistryStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, StrandError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path).map_err(|e| {
            StrandError::Storage(format!("Failed to open RocksDB at {}: {}", path, e))
        })?;

        Ok(Self { db })
    }

    /// Build the key for a location entry: `loc:{hash}:{node}`.
    fn location_key(hash: &ContentHash, node: &NodeId) -> Vec<u8> {
        format!("{}{}:{}", LOCATION_PREFIX, hash.to_hex(), node.to_hex()).into_bytes()
    }

    /// Split a `loc:{hash}:{node}` key back into its content hash.
    fn parse_location_key(key: &[u8]) -> Option<ContentHash> {
        let key = std::str::from_utf8(key).ok()?;
        let rest = key.strip_prefix(LOCATION_PREFIX)?;
        let (hash_hex, _node_hex) = rest.split_once(':')?;
        hash_hex.parse().ok()
    }

    /// Put raw bytes into RocksDB, mapping errors to StrandError::Storage.
    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StrandError> {
        self.db
            .put(key, value)
            .map_err(|e| StrandError::Storage(format!("RocksDB put failed: {}", e)))
    }

    /// Get raw bytes from RocksDB, mapping errors to StrandError::Storage.
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrandError> {
        self.db
            .get(key)
            .map_err(|e| StrandError::Storage(format!("RocksDB get failed: {}", e)))
    }

    /// Delete a key from RocksDB, mapping errors to StrandError::Storage.
    fn delete_raw(&self, key: &[u8]) -> Result<(), StrandError> {
        self.db
            .delete(key)
            .map_err(|e| StrandError::Storage(format!("RocksDB delete failed: {}", e)))
    }

    /// Read a single entry without going through the async trait.
    pub fn get_entry_sync(
        &self,
        hash: &ContentHash,
        node: &NodeId,
    ) -> Result<Option<LocationEntry>, StrandError> {
        match self.get_raw(&Self::location_key(hash, node))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RegistryStore for RocksRegistryStore {
    async fn upsert_entry(
        &self,
        hash: &ContentHash,
        entry: &LocationEntry,
    ) -> Result<(), StrandError> {
        let json = serde_json::to_vec(entry)?;
        self.put_raw(&Self::location_key(hash, &entry.node), &json)
    }

    async fn remove_entry(&self, hash: &ContentHash, node: &NodeId) -> Result<(), StrandError> {
        self.delete_raw(&Self::location_key(hash, node))
    }

    async fn load_entries(&self) -> Result<Vec<(ContentHash, LocationEntry)>, StrandError> {
        let prefix = LOCATION_PREFIX.as_bytes();
        let mut entries = Vec::new();

        for item in self.db.prefix_iterator(prefix) {
            let (key, value) = item
                .map_err(|e| StrandError::Storage(format!("RocksDB iteration error: {}", e)))?;

            // Stop when the prefix no longer matches.
            if !key.starts_with(prefix) {
                break;
            }

            let Some(hash) = Self::parse_location_key(&key) else {
                tracing::warn!(
                    "Skipping malformed registry key {}",
                    String::from_utf8_lossy(&key)
                );
                continue;
            };
            match serde_json::from_slice::<LocationEntry>(&value) {
                Ok(entry) => entries.push((hash, entry)),
                Err(e) => {
                    tracing::warn!("Skipping undecodable entry for {}: {}", hash.short(), e);
                }
            }
        }

        Ok(entries)
    }
}
