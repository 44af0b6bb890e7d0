// crates/strand-probe/src/prober.rs
//
// Prober: one probe = resolve address, fetch and verify under a timeout, then
// apply the outcome to the registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use strand_core::crypto::{probe_attestation_message, verify_signature};
use strand_core::error::StrandError;
use strand_core::ids::{Address, ContentHash, NodeId};
use strand_core::probe::{ProbeOutcome, ProbeResult};
use strand_core::traits::{FetchedContent, PeerTransport};
use strand_registry::{LocationRegistry, TrustUpdate};

/// Upper bound on a probe's fetch and verification.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Verdict of a probe plus its effect on the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub result: ProbeResult,
    /// `None` when the registry could not record the outcome (storage fault).
    pub update: Option<TrustUpdate>,
}

impl ProbeReport {
    pub fn trust_updated(&self) -> bool {
        self.update.map(|u| u.changed()).unwrap_or(false)
    }

    pub fn trust(&self) -> Option<f64> {
        self.update.and_then(|u| u.trust())
    }

    pub fn evicted(&self) -> bool {
        self.update.map(|u| u.is_evicted()).unwrap_or(false)
    }
}

/// Check a peer's answer against what was asked.
///
/// The responder must be `node`, its signature must verify under `node`'s
/// key, and the bytes must hash to `hash`. Any failure is a
/// `VerificationMismatch`.
pub fn verify_fetched(
    hash: &ContentHash,
    node: &NodeId,
    fetched: &FetchedContent,
) -> Result<(), StrandError> {
    if fetched.responder != *node {
        return Err(StrandError::VerificationMismatch(format!(
            "expected node {}, responder identified as {}",
            node.short(),
            fetched.responder.short()
        )));
    }

    let message = probe_attestation_message(hash, &fetched.data);
    match verify_signature(node, &message, &fetched.signature) {
        Ok(true) => {}
        Ok(false) => {
            return Err(StrandError::VerificationMismatch(
                "attestation signature does not verify".to_string(),
            ))
        }
        Err(e) => {
            return Err(StrandError::VerificationMismatch(format!(
                "attestation signature is malformed: {}",
                e
            )))
        }
    }

    if !hash.matches(&fetched.data) {
        return Err(StrandError::VerificationMismatch(format!(
            "served {} bytes whose digest is not {}",
            fetched.data.len(),
            hash.short()
        )));
    }

    Ok(())
}

/// Runs probes against peers and records the verdicts.
#[derive(Clone)]
pub struct Prober {
    registry: Arc<LocationRegistry>,
    transport: Arc<dyn PeerTransport>,
    timeout: Duration,
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Prober {
    pub fn new(registry: Arc<LocationRegistry>, transport: Arc<dyn PeerTransport>) -> Self {
        Self {
            registry,
            transport,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn registry(&self) -> &Arc<LocationRegistry> {
        &self.registry
    }

    /// Probe `node` for `hash` and update its trust.
    ///
    /// An explicit `address` takes precedence over the registry's stored one
    /// and is remembered if the probe succeeds. Probe failures are reported
    /// in the result, never as errors.
    pub async fn probe(
        &self,
        hash: &ContentHash,
        node: &NodeId,
        address: Option<Address>,
    ) -> ProbeReport {
        self.retrieve(hash, node, address).await.0
    }

    /// Like `probe`, but also hands back the verified bytes on success.
    ///
    /// Content pulls go through here so every download doubles as a probe.
    pub async fn retrieve(
        &self,
        hash: &ContentHash,
        node: &NodeId,
        address: Option<Address>,
    ) -> (ProbeReport, Option<Vec<u8>>) {
        let target = match &address {
            Some(explicit) => Some(explicit.clone()),
            None => self.registry.address_of(hash, node).await,
        };

        let (mut result, data) = match &target {
            Some(target) => self.bounded_exchange(target, hash, node).await,
            None => (
                ProbeResult::failure(
                    ProbeOutcome::Unreachable,
                    Duration::ZERO,
                    format!("no known address for {}", node.short()),
                ),
                None,
            ),
        };

        let learned = if result.is_success() { address } else { None };
        let update = match self
            .registry
            .apply_probe_outcome(hash, node, result.outcome, learned)
            .await
        {
            Ok(update) => Some(update),
            Err(e) => {
                tracing::error!(
                    "Failed to record probe outcome for {}@{}: {}",
                    node.short(),
                    hash.short(),
                    e
                );
                let detail = format!("trust not updated: {}", e);
                result.message = Some(match result.message.take() {
                    Some(existing) => format!("{}; {}", existing, detail),
                    None => detail,
                });
                None
            }
        };

        tracing::info!(
            "Probe {}@{}: {} in {:?}",
            node.short(),
            hash.short(),
            result.outcome,
            result.elapsed
        );
        (ProbeReport { result, update }, data)
    }

    /// Fetch and verify under the probe timeout. Expiry is Unreachable.
    async fn bounded_exchange(
        &self,
        target: &Address,
        hash: &ContentHash,
        node: &NodeId,
    ) -> (ProbeResult, Option<Vec<u8>>) {
        let start = Instant::now();
        match tokio::time::timeout(self.timeout, self.exchange(target, hash, node, start)).await {
            Ok(done) => done,
            Err(_) => (
                ProbeResult::failure(
                    ProbeOutcome::Unreachable,
                    start.elapsed(),
                    format!("probe timed out after {:?}", self.timeout),
                ),
                None,
            ),
        }
    }

    /// The network half of a probe. No registry state is touched here.
    async fn exchange(
        &self,
        target: &Address,
        hash: &ContentHash,
        node: &NodeId,
        start: Instant,
    ) -> (ProbeResult, Option<Vec<u8>>) {
        let fetched = match self.transport.fetch(target, node, hash).await {
            Ok(fetched) => fetched,
            Err(StrandError::VerificationMismatch(reason)) => {
                let result = ProbeResult::failure(ProbeOutcome::Mismatch, start.elapsed(), reason);
                return (result, None);
            }
            Err(e) => {
                let result =
                    ProbeResult::failure(ProbeOutcome::Unreachable, start.elapsed(), e.to_string());
                return (result, None);
            }
        };
        // Let the timer fire before verifying if the fetch used up the budget.
        tokio::task::yield_now().await;
        let elapsed = start.elapsed();

        match verify_fetched(hash, node, &fetched) {
            Ok(()) => (
                ProbeResult::success(fetched.bytes_read, fetched.bytes_written, elapsed),
                Some(fetched.data),
            ),
            Err(e) => {
                tracing::warn!(
                    "Probe of {} for {} failed verification: {}",
                    node.short(),
                    hash.short(),
                    e
                );
                let result = ProbeResult::failure(ProbeOutcome::Mismatch, elapsed, e.to_string())
                    .with_bytes(fetched.bytes_read, fetched.bytes_written);
                (result, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use strand_core::crypto::Keypair;
    use strand_core::location::LocationEntry;
    use strand_core::traits::RegistryStore;
    use strand_trust::TrustPolicy;

    enum Behaviour {
        Honest,
        Corrupt,
        Impostor,
        Silent,
        Stalled,
        Down,
    }

    struct FakePeer {
        keypair: Keypair,
        data: Vec<u8>,
        behaviour: Behaviour,
    }

    #[async_trait]
    impl PeerTransport for FakePeer {
        async fn fetch(
            &self,
            _address: &Address,
            _node: &NodeId,
            hash: &ContentHash,
        ) -> Result<FetchedContent, StrandError> {
            let (responder, data, signature) = match self.behaviour {
                Behaviour::Honest => (
                    self.keypair.node_id(),
                    self.data.clone(),
                    self.keypair.attest_content(hash, &self.data),
                ),
                Behaviour::Corrupt => {
                    let mut data = self.data.clone();
                    data.push(0xff);
                    let signature = self.keypair.attest_content(hash, &data);
                    (self.keypair.node_id(), data, signature)
                }
                Behaviour::Impostor => {
                    let other = Keypair::generate();
                    let signature = other.attest_content(hash, &self.data);
                    (self.keypair.node_id(), self.data.clone(), signature)
                }
                Behaviour::Silent => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    unreachable!("probe should have timed out")
                }
                Behaviour::Stalled => {
                    // Answers correctly, but only after blocking past the budget.
                    std::thread::sleep(Duration::from_millis(150));
                    (
                        self.keypair.node_id(),
                        self.data.clone(),
                        self.keypair.attest_content(hash, &self.data),
                    )
                }
                Behaviour::Down => {
                    return Err(StrandError::Unreachable("connection refused".into()))
                }
            };
            Ok(FetchedContent {
                responder,
                bytes_read: data.len() as u64,
                bytes_written: 64,
                data,
                signature,
            })
        }
    }

    struct Fixture {
        registry: Arc<LocationRegistry>,
        prober: Prober,
        node: NodeId,
        hash: ContentHash,
        address: Address,
    }

    fn fixture(behaviour: Behaviour) -> Fixture {
        let data = b"probe me".to_vec();
        let peer = FakePeer {
            keypair: Keypair::generate(),
            data: data.clone(),
            behaviour,
        };
        let node = peer.keypair.node_id();
        let registry = Arc::new(LocationRegistry::new(TrustPolicy::default()));
        let prober = Prober::new(registry.clone(), Arc::new(peer))
            .with_timeout(Duration::from_millis(100));
        Fixture {
            registry,
            prober,
            node,
            hash: ContentHash::of(&data),
            address: Address::parse("http://127.0.0.1:9").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_honest_peer_gains_trust_and_address_is_learned() {
        let f = fixture(Behaviour::Honest);
        let report = f
            .prober
            .probe(&f.hash, &f.node, Some(f.address.clone()))
            .await;
        assert!(report.result.is_success());
        assert_eq!(report.result.bytes_read, 8);
        assert!(report.trust_updated());
        assert!((report.trust().unwrap() - 0.6).abs() < 1e-9);
        assert_eq!(
            f.registry.address_of(&f.hash, &f.node).await,
            Some(f.address.clone())
        );

        // Stored address is reused when none is given.
        let report = f.prober.probe(&f.hash, &f.node, None).await;
        assert!(report.result.is_success());
        assert!(report.trust().unwrap() > 0.6);
    }

    #[tokio::test]
    async fn test_corrupt_bytes_are_a_mismatch() {
        let f = fixture(Behaviour::Corrupt);
        f.registry
            .record_holder(&f.hash, &f.node, Some(f.address.clone()))
            .await
            .unwrap();
        let report = f.prober.probe(&f.hash, &f.node, None).await;
        assert_eq!(report.result.outcome, ProbeOutcome::Mismatch);
        assert_eq!(report.result.bytes_read, 9);
        assert!((report.trust().unwrap() - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_wrong_signer_is_a_mismatch() {
        let f = fixture(Behaviour::Impostor);
        f.registry
            .record_holder(&f.hash, &f.node, Some(f.address.clone()))
            .await
            .unwrap();
        let report = f.prober.probe(&f.hash, &f.node, None).await;
        assert_eq!(report.result.outcome, ProbeOutcome::Mismatch);
        assert!(report.result.message.unwrap().contains("signature"));
    }

    #[tokio::test]
    async fn test_timeout_is_unreachable() {
        let f = fixture(Behaviour::Silent);
        f.registry
            .record_holder(&f.hash, &f.node, Some(f.address.clone()))
            .await
            .unwrap();
        let report = f.prober.probe(&f.hash, &f.node, None).await;
        assert_eq!(report.result.outcome, ProbeOutcome::Unreachable);
        assert!(report.result.message.as_ref().unwrap().contains("timed out"));
        assert!((report.trust().unwrap() - 0.35).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_answer_past_the_budget_is_unreachable() {
        let f = fixture(Behaviour::Stalled);
        f.registry
            .record_holder(&f.hash, &f.node, Some(f.address.clone()))
            .await
            .unwrap();
        let report = f.prober.probe(&f.hash, &f.node, None).await;
        assert_eq!(report.result.outcome, ProbeOutcome::Unreachable);
        assert!(report.result.message.unwrap().contains("timed out"));
        assert!(report.result.elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_missing_address_is_unreachable_and_untracked() {
        let f = fixture(Behaviour::Honest);
        let report = f.prober.probe(&f.hash, &f.node, None).await;
        assert_eq!(report.result.outcome, ProbeOutcome::Unreachable);
        assert_eq!(report.update, Some(TrustUpdate::Untracked));
        assert!(!report.trust_updated());
        assert!(f.registry.lookup(&f.hash).await.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_failures_evict() {
        let f = fixture(Behaviour::Down);
        f.registry
            .record_holder(&f.hash, &f.node, Some(f.address.clone()))
            .await
            .unwrap();
        let mut last = None;
        for _ in 0..5 {
            last = Some(f.prober.probe(&f.hash, &f.node, None).await);
        }
        assert!(last.unwrap().evicted());
        assert!(f.registry.entry(&f.hash, &f.node).await.is_none());
    }

    struct FlakyStore {
        broken: AtomicBool,
    }

    #[async_trait]
    impl RegistryStore for FlakyStore {
        async fn upsert_entry(
            &self,
            _hash: &ContentHash,
            _entry: &LocationEntry,
        ) -> Result<(), StrandError> {
            if self.broken.load(Ordering::SeqCst) {
                Err(StrandError::Storage("disk full".into()))
            } else {
                Ok(())
            }
        }

        async fn remove_entry(&self, _hash: &ContentHash, _node: &NodeId) -> Result<(), StrandError> {
            Ok(())
        }

        async fn load_entries(&self) -> Result<Vec<(ContentHash, LocationEntry)>, StrandError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_storage_fault_is_reported_not_raised() {
        let keypair = Keypair::generate();
        let node = keypair.node_id();
        let data = b"probe me".to_vec();
        let hash = ContentHash::of(&data);
        let store = Arc::new(FlakyStore {
            broken: AtomicBool::new(false),
        });
        let registry = Arc::new(
            LocationRegistry::new(TrustPolicy::default()).with_store(store.clone()),
        );
        registry.record_holder(&hash, &node, None).await.unwrap();
        store.broken.store(true, Ordering::SeqCst);

        let peer = FakePeer {
            keypair,
            data,
            behaviour: Behaviour::Honest,
        };
        let prober = Prober::new(registry.clone(), Arc::new(peer));
        let address = Address::parse("http://127.0.0.1:9").unwrap();
        let report = prober.probe(&hash, &node, Some(address)).await;

        assert!(report.result.is_success());
        assert!(!report.trust_updated());
        assert!(report.result.message.unwrap().contains("disk full"));
        assert_eq!(registry.entry(&hash, &node).await.unwrap().trust, 0.5);
    }
}
