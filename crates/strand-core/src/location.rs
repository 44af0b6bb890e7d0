// crates/strand-core/src/location.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{Address, NodeId};

/// Belief that `node` holds a copy of some content.
///
/// One entry exists per (ContentHash, NodeId) pair. The registry owns these;
/// everything else sees copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    /// The peer believed to hold the content.
    pub node: NodeId,
    /// Confidence in the peer's copy, always within [0.0, 1.0].
    pub trust: f64,
    /// When this entry was created or last updated by a probe outcome.
    pub last_verified: DateTime<Utc>,
    /// Last known RPC endpoint of the peer, if any.
    pub address: Option<Address>,
    /// Failed probes since the last success.
    pub consecutive_failures: u32,
}

impl LocationEntry {
    /// A fresh entry at the given prior trust.
    pub fn new(node: NodeId, prior: f64, address: Option<Address>, now: DateTime<Utc>) -> Self {
        Self {
            node,
            trust: prior,
            last_verified: now,
            address,
            consecutive_failures: 0,
        }
    }

    /// True if the trust value is a finite number inside [0.0, 1.0].
    pub fn trust_in_bounds(&self) -> bool {
        self.trust.is_finite() && (0.0..=1.0).contains(&self.trust)
    }
}
