use thiserror::Error;

/// Error kinds surfaced by the Strand core and its collaborators.
///
/// "Nothing known" is not an error: lookups on unknown hashes return empty
/// results. `NotFound` is reserved for lookups of a specific object (a pool
/// id, a local blob) that does not exist.
#[derive(Debug, Error)]
pub enum StrandError {
    /// A specific object (pool, local content) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or transport failure while reaching a peer.
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// A peer answered with content or credentials that do not match the request.
    #[error("Verification mismatch: {0}")]
    VerificationMismatch(String),

    /// Pool creation found no registry entry above the participation threshold.
    #[error("No eligible holders for {0}")]
    NoEligibleHolders(String),

    /// Registry invariant violation. Fails the operation, never the process.
    #[error("Internal fault: {0}")]
    InternalFault(String),

    /// The caller may not invoke this operation (remote control call,
    /// path outside the share root).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed caller input (bad hash, bad node id, bad address).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage layer error (RocksDB, blob directory).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cryptographic error (key loading, signing).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),
}

impl StrandError {
    /// Stable machine-readable code used at the RPC boundary.
    pub fn code(&self) -> &'static str {
        match self {
            StrandError::NotFound(_) => "not_found",
            StrandError::Unreachable(_) => "unreachable",
            StrandError::VerificationMismatch(_) => "verification_mismatch",
            StrandError::NoEligibleHolders(_) => "no_eligible_holders",
            StrandError::InternalFault(_) => "internal",
            StrandError::Forbidden(_) => "forbidden",
            StrandError::InvalidInput(_) => "invalid_input",
            StrandError::Storage(_) => "storage",
            StrandError::Serialization(_) => "serialization",
            StrandError::Crypto(_) => "crypto",
            StrandError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for StrandError {
    fn from(e: serde_json::Error) -> Self {
        StrandError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for StrandError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        StrandError::Crypto(e.to_string())
    }
}

impl From<std::io::Error> for StrandError {
    fn from(e: std::io::Error) -> Self {
        StrandError::Storage(e.to_string())
    }
}
