// crates/strand-probe/src/lib.rs
//
// strand-probe: active verification of claimed content holders.
//
// A probe fetches content from a peer through a `PeerTransport`, checks the
// responder's identity, signature and SHA-256 digest, and feeds the verdict
// back into the LocationRegistry. The network exchange never runs under a
// registry lock.

pub mod prober;
pub mod sweep;
pub mod transport;

pub use prober::{verify_fetched, ProbeReport, Prober, DEFAULT_PROBE_TIMEOUT};
pub use sweep::sweep_pool;
pub use transport::{HttpTransport, DEFAULT_MAX_RESPONSE_BYTES};
