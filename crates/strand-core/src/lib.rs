// crates/strand-core/src/lib.rs
//
// strand-core: Core types, traits, and crypto primitives for Strand.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines content and node identifiers, the per-location trust record,
// probe result values, pool snapshots, the error type, and the capability
// traits (registry persistence, content storage, peer transport) that the
// registry and probe crates are written against.

pub mod crypto;
pub mod error;
pub mod ids;
pub mod location;
pub mod pool;
pub mod probe;
pub mod traits;
pub mod wire;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use strand_core::ContentHash;`

pub use ids::{Address, ContentHash, NodeId};
pub use location::LocationEntry;
pub use pool::Pool;
pub use probe::{ProbeOutcome, ProbeResult};

// Error type
pub use error::StrandError;

// Traits
pub use traits::{ContentStore, FetchedContent, PeerTransport, RegistryStore};

// Wire envelope
pub use wire::{JsonRpcRequest, JsonRpcResponse, RPC_SERVICE_NAME};
