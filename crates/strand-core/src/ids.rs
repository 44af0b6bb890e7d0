// crates/strand-core/src/ids.rs
//
// Identifiers: ContentHash (SHA-256 of content), NodeId (ed25519 public key),
// and Address (RPC endpoint URL of a peer).
//
// Both 32-byte identifiers use lowercase hex as their text and serde form so
// they can travel inside JSON-RPC params unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::hash_bytes;
use crate::error::StrandError;

/// Parse a 64-character hex string into 32 bytes.
fn parse_hex32(kind: &str, s: &str) -> Result<[u8; 32], StrandError> {
    let bytes = hex::decode(s.trim())
        .map_err(|e| StrandError::InvalidInput(format!("{} is not valid hex: {}", kind, e)))?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        StrandError::InvalidInput(format!("{} must be 32 bytes, got {}", kind, v.len()))
    })
}

macro_rules! hex_identifier {
    ($name:ident, $kind:literal) => {
        impl $name {
            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Lowercase hex form.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// First 8 hex characters, for log lines.
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short())
            }
        }

        impl FromStr for $name {
            type Err = StrandError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex32($kind, s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Content identifier: the SHA-256 digest of the content bytes.
///
/// Equality is exact-byte comparison. This is the sole registry key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

hex_identifier!(ContentHash, "content hash");

impl ContentHash {
    /// Hash content bytes.
    pub fn of(data: &[u8]) -> Self {
        Self(hash_bytes(data))
    }

    /// Byte-exact check that `data` hashes to this identifier.
    pub fn matches(&self, data: &[u8]) -> bool {
        hash_bytes(data) == self.0
    }
}

/// Peer identifier: the node's ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId([u8; 32]);

hex_identifier!(NodeId, "node id");

/// Reachable RPC endpoint of a peer, e.g. `http://10.0.0.2:50051`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Validate and wrap an endpoint URL. Only http and https are accepted.
    pub fn parse(s: &str) -> Result<Self, StrandError> {
        let s = s.trim();
        let rest = s
            .strip_prefix("http://")
            .or_else(|| s.strip_prefix("https://"))
            .ok_or_else(|| {
                StrandError::InvalidInput(format!("address must be an http(s) URL: {}", s))
            })?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(StrandError::InvalidInput(format!("address has no host: {}", s)));
        }
        Ok(Self(s.trim_end_matches('/').to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = StrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}
