// crates/strand-trust/src/lib.rs
//
// strand-trust: Trust model for Strand.
//
// Trust is scoped to a single (content, peer) pair and moves only in response
// to probe outcomes: successes approach 1.0 exponentially, failures decay
// toward 0.0 faster, and a content mismatch decays faster still. Everything
// here is pure; the registry owns the state these functions update.

pub mod model;

pub use model::{update, TrustPolicy, MAX_TRUST};
