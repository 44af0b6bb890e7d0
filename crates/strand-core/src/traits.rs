// crates/strand-core/src/traits.rs
//
// Capabilities injected into the registry and probe crates. The core never
// talks to disk or to the network directly; it goes through these.

use async_trait::async_trait;

use crate::error::StrandError;
use crate::ids::{Address, ContentHash, NodeId};
use crate::location::LocationEntry;

/// Durable storage for registry state.
///
/// Implemented by strand-store (RocksDB and in-memory backends).
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Insert or overwrite the entry for (hash, entry.node).
    async fn upsert_entry(&self, hash: &ContentHash, entry: &LocationEntry)
        -> Result<(), StrandError>;

    /// Remove the entry for (hash, node). Removing a missing entry is not an error.
    async fn remove_entry(&self, hash: &ContentHash, node: &NodeId) -> Result<(), StrandError>;

    /// Load every persisted entry, used to rebuild the registry at start-up.
    async fn load_entries(&self) -> Result<Vec<(ContentHash, LocationEntry)>, StrandError>;
}

/// Local content-addressed blob storage.
///
/// Implemented by strand-store (filesystem and in-memory backends).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their hash. Storing the same bytes twice is a no-op.
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StrandError>;

    /// Read the bytes for a hash, if held locally.
    async fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>, StrandError>;

    /// Whether the content is held locally.
    async fn contains(&self, hash: &ContentHash) -> Result<bool, StrandError>;

    /// All locally held hashes with their sizes in bytes.
    async fn list(&self) -> Result<Vec<(ContentHash, u64)>, StrandError>;
}

/// What a peer sent back for a content request.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// The node id the responder claims to be.
    pub responder: NodeId,
    /// The content bytes as received.
    pub data: Vec<u8>,
    /// Responder's ed25519 signature over the probe attestation message.
    pub signature: Vec<u8>,
    /// Bytes received on the wire.
    pub bytes_read: u64,
    /// Bytes sent on the wire.
    pub bytes_written: u64,
}

/// Outbound request capability used by probes and content pulls.
///
/// Implemented by strand-probe (HTTP JSON-RPC client).
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Ask the peer at `address` (expected to be `node`) for the content of `hash`.
    ///
    /// Transport failures map to `StrandError::Unreachable`; a peer that
    /// reports it does not hold the content maps to `StrandError::NotFound`.
    async fn fetch(
        &self,
        address: &Address,
        node: &NodeId,
        hash: &ContentHash,
    ) -> Result<FetchedContent, StrandError>;
}
