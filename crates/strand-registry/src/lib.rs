// crates/strand-registry/src/lib.rs
//
// strand-registry: who holds what, and how much we believe it.
//
// The LocationRegistry is the single source of truth for (content, peer)
// trust. The PoolManager, QueryResolver and ShareIntake are thin, stateless
// (or snapshot-holding) views over it.

pub mod intake;
pub mod pool;
pub mod query;
pub mod ranking;
pub mod registry;

pub use intake::{ShareIntake, ShareOutcome};
pub use pool::{MemberView, PoolManager};
pub use query::QueryResolver;
pub use registry::{LocationRegistry, TrustUpdate};
