// crates/strand-probe/src/transport.rs
//
// HttpTransport: PeerTransport over the peer's JSON-RPC endpoint.
//
// Sends `content/fetch` and decodes the signed answer. Anything that stops
// us from getting a well-formed strand answer (connection errors, HTTP
// errors, a non-strand server) is Unreachable. A strand answer whose payload
// does not decode, or that exceeds the response size cap, is a
// VerificationMismatch.

use std::time::Duration;

use async_trait::async_trait;

use strand_core::error::StrandError;
use strand_core::ids::{Address, ContentHash, NodeId};
use strand_core::traits::{FetchedContent, PeerTransport};
use strand_core::wire::{rpc_url, FetchRequest, FetchResponse, JsonRpcRequest, JsonRpcResponse};

/// Largest `content/fetch` answer read from a peer. The body is hex inside
/// JSON, so this admits content of a little under half the size.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl HttpTransport {
    /// Build a transport whose HTTP client gives up after `timeout`.
    ///
    /// The prober applies its own timeout as well; this one only stops stray
    /// connections from outliving it.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    /// Cap the size of a peer's answer.
    pub fn with_max_response_bytes(mut self, max: usize) -> Self {
        self.max_response_bytes = max;
        self
    }

    /// Read the body, refusing to buffer more than the cap.
    async fn read_capped(
        &self,
        address: &Address,
        mut resp: reqwest::Response,
    ) -> Result<Vec<u8>, StrandError> {
        let too_large = |len: u64| {
            StrandError::VerificationMismatch(format!(
                "{} sent a {} byte answer, limit is {}",
                address, len, self.max_response_bytes
            ))
        };
        if let Some(len) = resp.content_length() {
            if len > self.max_response_bytes as u64 {
                return Err(too_large(len));
            }
        }

        let mut raw = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| StrandError::Unreachable(format!("{}: {}", address, e)))?
        {
            if raw.len() + chunk.len() > self.max_response_bytes {
                return Err(too_large((raw.len() + chunk.len()) as u64));
            }
            raw.extend_from_slice(&chunk);
        }
        Ok(raw)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(crate::prober::DEFAULT_PROBE_TIMEOUT)
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, StrandError> {
    hex::decode(value).map_err(|e| {
        StrandError::VerificationMismatch(format!("peer sent invalid {} hex: {}", field, e))
    })
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn fetch(
        &self,
        address: &Address,
        node: &NodeId,
        hash: &ContentHash,
    ) -> Result<FetchedContent, StrandError> {
        let request = JsonRpcRequest::new(
            "content/fetch",
            &FetchRequest {
                hash: *hash,
                node_id: *node,
            },
        )?;
        let body = serde_json::to_vec(&request)?;
        let bytes_written = body.len() as u64;
        let url = rpc_url(address.as_str());

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| StrandError::Unreachable(format!("{}: {}", address, e)))?;

        if !resp.status().is_success() {
            return Err(StrandError::Unreachable(format!(
                "{} answered HTTP {}",
                address,
                resp.status()
            )));
        }

        let raw = self.read_capped(address, resp).await?;
        let bytes_read = raw.len() as u64;

        let envelope: JsonRpcResponse = serde_json::from_slice(&raw).map_err(|e| {
            StrandError::Unreachable(format!("{} is not a strand endpoint: {}", address, e))
        })?;

        if !envelope.success {
            let message = envelope.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(match envelope.error_code.as_deref() {
                Some("not_found") => StrandError::NotFound(message),
                _ => StrandError::Unreachable(message),
            });
        }

        let result = envelope.result.ok_or_else(|| {
            StrandError::VerificationMismatch("peer sent success without a result".to_string())
        })?;
        let fetched: FetchResponse = serde_json::from_value(result).map_err(|e| {
            StrandError::VerificationMismatch(format!("malformed fetch response: {}", e))
        })?;

        Ok(FetchedContent {
            responder: fetched.node_id,
            data: decode_hex("data", &fetched.data_hex)?,
            signature: decode_hex("signature", &fetched.signature_hex)?,
            bytes_read,
            bytes_written,
        })
    }
}
