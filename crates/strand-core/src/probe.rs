// crates/strand-core/src/probe.rs
//
// Value objects produced by one probe of a (content, peer) pair.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Classified result of a probe, as consumed by the trust model.
///
/// `Unreachable` and `Mismatch` are both failures, but a mismatch means the
/// peer answered with the wrong bytes (or answered as someone else), so it is
/// penalised harder than plain unavailability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The peer returned byte-correct content.
    Success,
    /// Timeout, refused connection, no route, no known address.
    Unreachable,
    /// Wrong, truncated or unauthenticated content.
    Mismatch,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Success => write!(f, "success"),
            ProbeOutcome::Unreachable => write!(f, "unreachable"),
            ProbeOutcome::Mismatch => write!(f, "mismatch"),
        }
    }
}

/// Transfer statistics and verdict of one probe. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    /// Response bytes received from the peer.
    pub bytes_read: u64,
    /// Request bytes sent to the peer.
    pub bytes_written: u64,
    /// Wall-clock time of the network exchange.
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    /// Human-readable detail, set on failures.
    pub message: Option<String>,
}

impl ProbeResult {
    pub fn success(bytes_read: u64, bytes_written: u64, elapsed: Duration) -> Self {
        Self {
            outcome: ProbeOutcome::Success,
            bytes_read,
            bytes_written,
            elapsed,
            message: None,
        }
    }

    pub fn failure(outcome: ProbeOutcome, elapsed: Duration, message: impl Into<String>) -> Self {
        Self {
            outcome,
            bytes_read: 0,
            bytes_written: 0,
            elapsed,
            message: Some(message.into()),
        }
    }

    /// Attach transfer counts to a failure that still moved bytes (a mismatch).
    pub fn with_bytes(mut self, bytes_read: u64, bytes_written: u64) -> Self {
        self.bytes_read = bytes_read;
        self.bytes_written = bytes_written;
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
