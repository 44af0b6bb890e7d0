// crates/strand-daemon/tests/common/mod.rs
//
// Shared harness for daemon integration tests: in-process nodes wired
// together through a loopback transport that calls each node's RPC
// dispatcher directly, so every probe exercises the real `content/fetch`
// handler without opening sockets.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use strand_core::crypto::Keypair;
use strand_core::error::StrandError;
use strand_core::ids::{Address, ContentHash, NodeId};
use strand_core::traits::{FetchedContent, PeerTransport, RegistryStore};
use strand_core::wire::{FetchRequest, FetchResponse, JsonRpcRequest, JsonRpcResponse};
use strand_registry::LocationRegistry;
use strand_rpc::{Caller, NodeServices, RpcConfig, StrandRpcServer};
use strand_store::MemoryContentStore;
use strand_trust::TrustPolicy;

/// Create a temporary directory path using UUID to avoid conflicts.
pub fn temp_db_path(label: &str) -> String {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("strand_test_{}_{}", label, Uuid::now_v7()));
    path.to_string_lossy().to_string()
}

/// Routes `content/fetch` to registered in-process nodes by address.
#[derive(Default)]
pub struct LoopbackNetwork {
    nodes: RwLock<HashMap<Address, StrandRpcServer>>,
}

impl LoopbackNetwork {
    pub async fn attach(&self, address: Address, server: StrandRpcServer) {
        self.nodes.write().await.insert(address, server);
    }

    /// Take a node offline; later fetches to it are Unreachable.
    pub async fn detach(&self, address: &Address) {
        self.nodes.write().await.remove(address);
    }
}

#[async_trait]
impl PeerTransport for LoopbackNetwork {
    async fn fetch(
        &self,
        address: &Address,
        node: &NodeId,
        hash: &ContentHash,
    ) -> Result<FetchedContent, StrandError> {
        let server = self
            .nodes
            .read()
            .await
            .get(address)
            .cloned()
            .ok_or_else(|| StrandError::Unreachable(format!("{} is offline", address)))?;

        let request = JsonRpcRequest::new(
            "content/fetch",
            &FetchRequest {
                hash: *hash,
                node_id: *node,
            },
        )?;
        let bytes_written = serde_json::to_vec(&request)?.len() as u64;
        let response = server.handle_from(request, Caller::Remote).await;
        let bytes_read = serde_json::to_vec(&response)?.len() as u64;

        if !response.success {
            let message = response.error.unwrap_or_default();
            return Err(match response.error_code.as_deref() {
                Some("not_found") => StrandError::NotFound(message),
                _ => StrandError::Unreachable(message),
            });
        }
        let fetched: FetchResponse =
            serde_json::from_value(response.result.unwrap_or_default())?;
        Ok(FetchedContent {
            responder: fetched.node_id,
            data: hex::decode(fetched.data_hex)
                .map_err(|e| StrandError::VerificationMismatch(e.to_string()))?,
            signature: hex::decode(fetched.signature_hex)
                .map_err(|e| StrandError::VerificationMismatch(e.to_string()))?,
            bytes_read,
            bytes_written,
        })
    }
}

/// One in-process node.
pub struct TestNode {
    pub id: NodeId,
    pub address: Address,
    pub services: NodeServices,
    pub server: StrandRpcServer,
    pub content: Arc<MemoryContentStore>,
}

impl TestNode {
    /// Dispatch a JSON-RPC call against this node as a local client.
    pub async fn call(&self, method: &str, params: serde_json::Value) -> JsonRpcResponse {
        self.server
            .handle(JsonRpcRequest {
                method: method.to_string(),
                params,
            })
            .await
    }

    /// Dispatch a JSON-RPC call against this node as another machine would.
    pub async fn call_remote(&self, method: &str, params: serde_json::Value) -> JsonRpcResponse {
        self.server
            .handle_from(
                JsonRpcRequest {
                    method: method.to_string(),
                    params,
                },
                Caller::Remote,
            )
            .await
    }

    /// Share bytes through the RPC surface and return their hash.
    pub async fn share(&self, data: &[u8]) -> ContentHash {
        let resp = self
            .call("content/share", json!({ "data_hex": hex::encode(data) }))
            .await;
        assert!(resp.success, "share failed: {:?}", resp.error);
        ContentHash::of(data)
    }

    /// Let this node know `other` claims to hold `hash`.
    pub async fn learn_holder(&self, hash: &ContentHash, other: &TestNode) {
        self.services
            .registry
            .record_holder(hash, &other.id, Some(other.address.clone()))
            .await
            .unwrap();
    }

    pub async fn trust_of(&self, hash: &ContentHash, other: &TestNode) -> Option<f64> {
        self.services
            .registry
            .entry(hash, &other.id)
            .await
            .map(|e| e.trust)
    }
}

/// Start a node on the loopback network with an optional persistent store.
pub async fn spawn_node(
    net: &Arc<LoopbackNetwork>,
    port: u16,
    store: Option<Arc<dyn RegistryStore>>,
) -> TestNode {
    let registry = match store {
        Some(store) => LocationRegistry::restore(TrustPolicy::default(), store)
            .await
            .unwrap(),
        None => LocationRegistry::new(TrustPolicy::default()),
    };
    let keypair = Keypair::generate();
    let id = keypair.node_id();
    let address = Address::parse(&format!("http://10.0.0.{}:{}", port % 250 + 1, port)).unwrap();
    let content = Arc::new(MemoryContentStore::new());
    let services = NodeServices::new(
        Arc::new(keypair),
        Some(address.clone()),
        Arc::new(registry),
        net.clone(),
        Duration::from_millis(500),
        content.clone(),
    );
    let server = StrandRpcServer::new(RpcConfig::default(), services.clone());
    net.attach(address.clone(), server.clone()).await;

    TestNode {
        id,
        address,
        services,
        server,
        content,
    }
}
