// crates/strand-rpc/src/services.rs
//
// NodeServices: the component graph a node serves over RPC.
//
// Built once by the daemon (or a test harness) around a single registry, then
// shared by the RPC server and the re-probe scheduler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use strand_core::crypto::Keypair;
use strand_core::ids::{Address, NodeId};
use strand_core::traits::{ContentStore, PeerTransport};
use strand_probe::Prober;
use strand_registry::{LocationRegistry, PoolManager, QueryResolver, ShareIntake};

#[derive(Clone)]
pub struct NodeServices {
    /// Node identity; signs `content/fetch` answers.
    pub keypair: Arc<Keypair>,
    /// This node's publicly reachable RPC address, if configured.
    pub self_address: Option<Address>,
    pub registry: Arc<LocationRegistry>,
    pub pools: Arc<PoolManager>,
    pub query: QueryResolver,
    pub intake: Arc<ShareIntake>,
    pub prober: Arc<Prober>,
    /// Local content blobs.
    pub content: Arc<dyn ContentStore>,
    /// Directory that `content/share` may read paths from. Path shares are
    /// refused when unset.
    pub share_root: Option<PathBuf>,
}

impl std::fmt::Debug for NodeServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeServices")
            .field("node_id", &self.self_id())
            .field("self_address", &self.self_address)
            .field("share_root", &self.share_root)
            .finish()
    }
}

impl NodeServices {
    /// Wire every component around `registry`.
    pub fn new(
        keypair: Arc<Keypair>,
        self_address: Option<Address>,
        registry: Arc<LocationRegistry>,
        transport: Arc<dyn PeerTransport>,
        probe_timeout: Duration,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        let self_id = keypair.node_id();
        let pools = Arc::new(PoolManager::new(registry.clone()));
        let query = QueryResolver::new(registry.clone());
        let intake = Arc::new(ShareIntake::new(
            registry.clone(),
            pools.clone(),
            self_id,
            self_address.clone(),
        ));
        let prober = Arc::new(Prober::new(registry.clone(), transport).with_timeout(probe_timeout));

        Self {
            keypair,
            self_address,
            registry,
            pools,
            query,
            intake,
            prober,
            content,
            share_root: None,
        }
    }

    /// Allow path shares from files under `root`.
    pub fn with_share_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.share_root = Some(root.into());
        self
    }

    pub fn self_id(&self) -> NodeId {
        self.keypair.node_id()
    }
}
