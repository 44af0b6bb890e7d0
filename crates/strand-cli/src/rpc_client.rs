// crates/strand-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs to the strand-daemon HTTP endpoint.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use strand_core::wire::{rpc_url, JsonRpcRequest, JsonRpcResponse};

/// Failures talking to the daemon.
#[derive(Debug, Error)]
pub enum RpcClientError {
    /// The daemon could not be reached or answered with a non-JSON body.
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The daemon answered with `success: false`.
    #[error("{message} ({code})")]
    Remote { code: String, message: String },

    /// The result did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RpcClientError {
    /// Stable error code reported by the daemon, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            RpcClientError::Remote { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Client bound to one daemon endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    endpoint: String,
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new(base: &str) -> Self {
        Self {
            endpoint: rpc_url(base),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one call and return the raw envelope.
    pub async fn call_raw<P: Serialize>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<JsonRpcResponse, RpcClientError> {
        let request = JsonRpcRequest {
            method: method.to_string(),
            params: serde_json::to_value(params)?,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Send one call and decode its result.
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, RpcClientError> {
        let response = self.call_raw(method, params).await?;
        unwrap_envelope(response)
    }
}

/// Turn an envelope into its typed result or a `Remote` error.
pub fn unwrap_envelope<R: DeserializeOwned>(response: JsonRpcResponse) -> Result<R, RpcClientError> {
    if !response.success {
        return Err(RpcClientError::Remote {
            code: response.error_code.unwrap_or_else(|| "unknown".to_string()),
            message: response.error.unwrap_or_else(|| "request failed".to_string()),
        });
    }
    Ok(serde_json::from_value(
        response.result.unwrap_or(serde_json::Value::Null),
    )?)
}
