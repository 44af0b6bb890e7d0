// crates/strand-store/src/lib.rs
//
// strand-store: Storage layer for Strand.
//
// Provides RocksDB-backed persistence for registry location entries, a
// filesystem content-addressed blob store, and in-memory implementations of
// both traits for tests and ephemeral nodes.

pub mod blobs;
pub mod memory;
pub mod rocks;

// Re-export key types for ergonomic access from downstream crates.
pub use blobs::FsContentStore;
pub use memory::{MemoryContentStore, MemoryRegistryStore};
pub use rocks::RocksRegistryStore;
