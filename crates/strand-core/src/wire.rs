// crates/strand-core/src/wire.rs
//
// JSON-RPC envelope shared by the daemon's RPC server and the peer transport.
//
// Requests are `{"method": ..., "params": {...}}` POSTed to
// `<address>/<RPC_SERVICE_NAME>/call`. Responses always carry `success`;
// failures add a human-readable `error` and a stable `error_code`.

use serde::{Deserialize, Serialize};

use crate::error::StrandError;
use crate::ids::{ContentHash, NodeId};

/// Service name the RPC server registers under. Also the URL path prefix.
pub const RPC_SERVICE_NAME: &str = "strand.rpc.StrandService";

/// Full RPC URL for a peer or daemon base address such as `http://host:50051`.
pub fn rpc_url(base: &str) -> String {
    format!("{}/{}/call", base.trim_end_matches('/'), RPC_SERVICE_NAME)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "probe/run", "content/fetch").
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    pub fn new<P: Serialize>(method: &str, params: &P) -> Result<Self, StrandError> {
        Ok(Self {
            method: method.to_string(),
            params: serde_json::to_value(params)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    /// Stable error kind (see `StrandError::code`), present when `success` is false.
    #[serde(default)]
    pub error_code: Option<String>,
}

impl JsonRpcResponse {
    pub fn ok(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            error_code: None,
        }
    }

    pub fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
            error_code: Some(code.to_string()),
        }
    }

    pub fn from_error(err: &StrandError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

/// Params of `content/fetch`: a peer asks this node to serve `hash`.
///
/// `node_id` is the identity the caller expects to be talking to; a node that
/// is not that identity still answers, and the caller detects the mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub hash: ContentHash,
    pub node_id: NodeId,
}

/// Result of `content/fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    /// The responder's own identity.
    pub node_id: NodeId,
    /// Served bytes, hex-encoded.
    pub data_hex: String,
    /// Hex ed25519 signature over the probe attestation message.
    pub signature_hex: String,
}
