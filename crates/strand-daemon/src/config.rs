// crates/strand-daemon/src/config.rs
//
// Runtime configuration for the Strand daemon.
// Loaded from a TOML file or populated with sensible defaults.
//
//   log_level = "info"
//
//   [node]
//   data_dir = "~/.strand/data"
//   key_path = "~/.strand/node.key"
//   self_url = "http://10.0.0.1:50051"
//   share_root = "~/shared"
//
//   [rpc]
//   host = "127.0.0.1"
//   port = 50051
//   allow_remote_control = false
//
//   [trust]
//   learning_rate = 0.2
//   failure_decay = 0.3
//   mismatch_decay = 0.6
//
//   [probe]
//   timeout_secs = 10
//   interval_secs = 300
//   max_concurrency = 8
//   max_response_bytes = 67108864

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use strand_core::ids::Address;
use strand_probe::DEFAULT_MAX_RESPONSE_BYTES;
use strand_rpc::RpcConfig;
use strand_trust::TrustPolicy;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Log level used when RUST_LOG is unset: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub trust: TrustPolicy,

    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Identity and storage locations.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Directory for the registry database and content blobs.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Hex-encoded ed25519 secret key. Generated on first start if missing.
    #[serde(default = "default_key_path")]
    pub key_path: String,

    /// This node's publicly reachable URL (e.g., "http://10.0.0.1:50051").
    /// Recorded with every share so peers can probe us.
    #[serde(default)]
    pub self_url: Option<String>,

    /// Directory `strand share --daemon-side` may read from. Path shares
    /// are refused when unset.
    #[serde(default)]
    pub share_root: Option<String>,
}

/// Probe timing and background re-probing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Upper bound on one probe's network exchange.
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds between background sweeps of all pools. 0 disables sweeping.
    #[serde(default = "default_probe_interval_secs")]
    pub interval_secs: u64,

    /// Probes in flight at once during a sweep.
    #[serde(default = "default_probe_concurrency")]
    pub max_concurrency: usize,

    /// Largest peer answer read during a probe or pull.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> String {
    "~/.strand/data".to_string()
}

fn default_key_path() -> String {
    "~/.strand/node.key".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_probe_interval_secs() -> u64 {
    300
}

fn default_probe_concurrency() -> usize {
    8
}

fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            node: NodeConfig::default(),
            rpc: RpcConfig::default(),
            trust: TrustPolicy::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            key_path: default_key_path(),
            self_url: None,
            share_root: None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout_secs(),
            interval_secs: default_probe_interval_secs(),
            max_concurrency: default_probe_concurrency(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `None` when background sweeping is disabled.
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: DaemonConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.trust.validate()?;
        if self.probe.timeout_secs == 0 {
            return Err("probe.timeout_secs must be at least 1".into());
        }
        if self.probe.max_concurrency == 0 {
            return Err("probe.max_concurrency must be at least 1".into());
        }
        if self.probe.max_response_bytes == 0 {
            return Err("probe.max_response_bytes must be at least 1".into());
        }
        self.self_address()?;
        Ok(())
    }

    /// The parsed self URL, if configured.
    pub fn self_address(&self) -> Result<Option<Address>, Box<dyn std::error::Error>> {
        match &self.node.self_url {
            Some(url) => Ok(Some(Address::parse(url)?)),
            None => Ok(None),
        }
    }
}
