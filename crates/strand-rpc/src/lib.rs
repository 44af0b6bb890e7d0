// crates/strand-rpc/src/lib.rs
//
// strand-rpc: JSON-RPC server and handlers for a Strand node.
//
// A single tonic service accepts JSON-encoded `{method, params}` requests
// over HTTP/1 and dispatches them to typed handlers. The same endpoint
// serves local clients (the CLI) and peers (`content/fetch` during probes).

pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;

pub use server::{method_scope, Caller, MethodScope, RpcConfig, StrandRpcServer};
pub use services::NodeServices;
