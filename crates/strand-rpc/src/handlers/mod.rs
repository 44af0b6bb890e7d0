// crates/strand-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints.
// Each module defines request/response types and handler functions
// for one API group.

pub mod content;
pub mod node;
pub mod pool;
pub mod probe;
pub mod query;
