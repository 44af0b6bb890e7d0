// crates/strand-rpc/src/middleware.rs
//
// Request interceptor for the RPC server.

use tonic::{Request, Status};

/// Log each incoming request's transport metadata at debug level.
///
/// Method-level logging happens in the dispatcher, where the JSON method name
/// is known.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    tracing::debug!("Incoming RPC request: {:?}", req.metadata());
    Ok(req)
}
