// crates/strand-core/src/crypto.rs

use std::fs;
use std::path::Path;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::StrandError;
use crate::ids::{ContentHash, NodeId};

/// Domain separator for probe attestations.
const PROBE_DOMAIN: &[u8] = b"strand-probe-v1";

/// An ed25519 keypair. The public half is the node's `NodeId`.
pub struct Keypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuild a keypair from its 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Parse a hex-encoded 32-byte secret, as stored in key files.
    pub fn from_secret_hex(hex_str: &str) -> Result<Self, StrandError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| StrandError::Crypto(format!("Invalid key hex: {}", e)))?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| StrandError::Crypto("Secret key must be exactly 32 bytes".to_string()))?;
        Ok(Self::from_secret_bytes(&secret))
    }

    /// Hex-encoded secret for writing key files.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// The node identity derived from the public key.
    pub fn node_id(&self) -> NodeId {
        NodeId::from_bytes(self.verifying_key.to_bytes())
    }

    /// Sign a message and return the signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }

    /// Read a hex key file.
    pub fn load(path: &Path) -> Result<Self, StrandError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            StrandError::Crypto(format!("Cannot read key file {}: {}", path.display(), e))
        })?;
        Self::from_secret_hex(&contents)
    }

    /// Write the secret as hex, creating parent directories. Owner-only on unix.
    pub fn save(&self, path: &Path) -> Result<(), StrandError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.secret_hex())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Load the key at `path`, or generate and save one if the file is absent.
    /// The flag is true when a new key was generated.
    pub fn load_or_generate(path: &Path) -> Result<(Self, bool), StrandError> {
        if path.exists() {
            return Ok((Self::load(path)?, false));
        }
        let keypair = Self::generate();
        keypair.save(path)?;
        Ok((keypair, true))
    }

    /// Sign the attestation that this node served `data` for `hash`.
    pub fn attest_content(&self, hash: &ContentHash, data: &[u8]) -> Vec<u8> {
        self.sign(&probe_attestation_message(hash, data))
    }
}

/// Message a responder signs when serving content to a probe:
/// `domain ‖ requested hash ‖ sha256(served bytes)`.
///
/// Binding the digest of the served bytes (not the requested hash alone)
/// means a valid signature commits the responder to exactly what it sent.
pub fn probe_attestation_message(hash: &ContentHash, data: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(PROBE_DOMAIN.len() + 64);
    message.extend_from_slice(PROBE_DOMAIN);
    message.extend_from_slice(hash.as_bytes());
    message.extend_from_slice(&hash_bytes(data));
    message
}

/// Verify an ed25519 signature made by `node`.
///
/// Returns `Ok(false)` for a well-formed but wrong signature, and an error if
/// the node id is not a valid public key or the signature has the wrong length.
pub fn verify_signature(
    node: &NodeId,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, StrandError> {
    let verifying_key = VerifyingKey::from_bytes(node.as_bytes())
        .map_err(|e| StrandError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| StrandError::Crypto("Signature must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Compute SHA-256 hash of the given bytes.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attestation_verifies_for_signer_only() {
        let keypair = Keypair::generate();
        let other = Keypair::generate();
        let data = b"block of content";
        let hash = ContentHash::of(data);

        let signature = keypair.attest_content(&hash, data);
        let message = probe_attestation_message(&hash, data);

        assert!(verify_signature(&keypair.node_id(), &message, &signature).unwrap());
        assert!(!verify_signature(&other.node_id(), &message, &signature).unwrap());
    }

    #[test]
    fn test_attestation_binds_served_bytes() {
        let keypair = Keypair::generate();
        let hash = ContentHash::of(b"real");
        let signature = keypair.attest_content(&hash, b"fake");

        let honest_message = probe_attestation_message(&hash, b"real");
        assert!(!verify_signature(&keypair.node_id(), &honest_message, &signature).unwrap());
    }

    #[test]
    fn test_secret_hex_roundtrip_keeps_identity() {
        let keypair = Keypair::generate();
        let restored = Keypair::from_secret_hex(&keypair.secret_hex()).unwrap();
        assert_eq!(restored.node_id(), keypair.node_id());
        assert!(Keypair::from_secret_hex("abcd").is_err());
    }

    #[test]
    fn test_short_signature_is_an_error() {
        let keypair = Keypair::generate();
        assert!(verify_signature(&keypair.node_id(), b"m", &[0u8; 10]).is_err());
    }

    #[test]
    fn test_key_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("strand_key_{}", uuid::Uuid::now_v7()))
            .join("node.key");
        let (first, created) = Keypair::load_or_generate(&path).unwrap();
        assert!(created);
        let (second, created) = Keypair::load_or_generate(&path).unwrap();
        assert!(!created);
        assert_eq!(first.node_id(), second.node_id());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_hash_bytes() {
        let hash = hash_bytes(b"strand");
        assert_eq!(hash, hash_bytes(b"strand"));
        assert_ne!(hash, hash_bytes(b"different"));
    }
}
