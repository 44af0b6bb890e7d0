// crates/strand-trust/src/model.rs
//
// Trust update rules:
//
//   success:     t' = t + (1 - t) * learning_rate     (capped below 1.0)
//   unreachable: t' = t * (1 - failure_decay)
//   mismatch:    t' = t * (1 - mismatch_decay)
//
// A pair with no history starts at `neutral_prior`.

use serde::{Deserialize, Serialize};

use strand_core::error::StrandError;
use strand_core::probe::ProbeOutcome;

/// Largest trust value a success can produce. Trust never reaches 1.0.
pub const MAX_TRUST: f64 = 1.0 - f64::EPSILON;

/// Tunable trust constants.
///
/// Defaults: learning rate 0.2, failure decay 0.3, mismatch decay 0.6,
/// neutral prior 0.5, eviction after 5 consecutive failures, pool
/// participation at trust >= 0.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustPolicy {
    /// Fraction of the remaining distance to 1.0 gained per success.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Fraction of trust lost per transport failure.
    #[serde(default = "default_failure_decay")]
    pub failure_decay: f64,

    /// Fraction of trust lost per verification mismatch.
    #[serde(default = "default_mismatch_decay")]
    pub mismatch_decay: f64,

    /// Starting trust for a pair with no history.
    #[serde(default = "default_neutral_prior")]
    pub neutral_prior: f64,

    /// Consecutive failures after which an entry is evicted.
    #[serde(default = "default_eviction_threshold")]
    pub eviction_threshold: u32,

    /// Minimum trust for a holder to be admitted to a pool.
    #[serde(default = "default_min_participation")]
    pub min_participation: f64,
}

fn default_learning_rate() -> f64 {
    0.2
}

fn default_failure_decay() -> f64 {
    0.3
}

fn default_mismatch_decay() -> f64 {
    0.6
}

fn default_neutral_prior() -> f64 {
    0.5
}

fn default_eviction_threshold() -> u32 {
    5
}

fn default_min_participation() -> f64 {
    0.1
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            failure_decay: default_failure_decay(),
            mismatch_decay: default_mismatch_decay(),
            neutral_prior: default_neutral_prior(),
            eviction_threshold: default_eviction_threshold(),
            min_participation: default_min_participation(),
        }
    }
}

impl TrustPolicy {
    /// Check that the constants describe a sane policy.
    ///
    /// Rates must lie strictly inside (0, 1), failures must be penalised
    /// harder than successes are rewarded, and a mismatch at least as hard
    /// as a transport failure.
    pub fn validate(&self) -> Result<(), StrandError> {
        let rates = [
            ("learning_rate", self.learning_rate),
            ("failure_decay", self.failure_decay),
            ("mismatch_decay", self.mismatch_decay),
        ];
        for (name, value) in rates {
            if !(value > 0.0 && value < 1.0) {
                return Err(StrandError::Config(format!(
                    "{} must be in (0, 1), got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.neutral_prior) {
            return Err(StrandError::Config(format!(
                "neutral_prior must be in [0, 1], got {}",
                self.neutral_prior
            )));
        }
        if !(0.0..=1.0).contains(&self.min_participation) {
            return Err(StrandError::Config(format!(
                "min_participation must be in [0, 1], got {}",
                self.min_participation
            )));
        }
        if self.failure_decay <= self.learning_rate {
            return Err(StrandError::Config(format!(
                "failure_decay ({}) must exceed learning_rate ({})",
                self.failure_decay, self.learning_rate
            )));
        }
        if self.mismatch_decay < self.failure_decay {
            return Err(StrandError::Config(format!(
                "mismatch_decay ({}) must be at least failure_decay ({})",
                self.mismatch_decay, self.failure_decay
            )));
        }
        if self.eviction_threshold == 0 {
            return Err(StrandError::Config(
                "eviction_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether an entry with this many consecutive failures must be evicted.
    pub fn should_evict(&self, consecutive_failures: u32) -> bool {
        consecutive_failures >= self.eviction_threshold
    }

    /// Whether a holder at this trust may join a pool.
    pub fn is_eligible(&self, trust: f64) -> bool {
        trust >= self.min_participation
    }
}

/// Apply one probe outcome to a trust value.
///
/// The input is clamped into [0.0, 1.0] first, so the result is always
/// inside [0.0, MAX_TRUST].
pub fn update(current: f64, outcome: ProbeOutcome, policy: &TrustPolicy) -> f64 {
    let current = if current.is_nan() {
        0.0
    } else {
        current.clamp(0.0, 1.0)
    };
    let next = match outcome {
        ProbeOutcome::Success => current + (1.0 - current) * policy.learning_rate,
        ProbeOutcome::Unreachable => current * (1.0 - policy.failure_decay),
        ProbeOutcome::Mismatch => current * (1.0 - policy.mismatch_decay),
    };
    next.clamp(0.0, MAX_TRUST)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_first_success_from_prior() {
        let policy = TrustPolicy::default();
        let t = update(policy.neutral_prior, ProbeOutcome::Success, &policy);
        assert!(approx(t, 0.6));
    }

    #[test]
    fn test_successes_strictly_increase_below_one() {
        let policy = TrustPolicy::default();
        let mut t = policy.neutral_prior;
        for _ in 0..60 {
            let next = update(t, ProbeOutcome::Success, &policy);
            assert!(next > t, "trust must increase: {} -> {}", t, next);
            assert!(next < 1.0);
            t = next;
        }
    }

    #[test]
    fn test_successes_never_reach_one_even_after_saturation() {
        let policy = TrustPolicy::default();
        let mut t = policy.neutral_prior;
        for _ in 0..10_000 {
            t = update(t, ProbeOutcome::Success, &policy);
        }
        assert!(t < 1.0);
        assert!(approx(t, MAX_TRUST));
    }

    #[test]
    fn test_failures_strictly_decrease_above_zero() {
        let policy = TrustPolicy::default();
        let mut t = policy.neutral_prior;
        for _ in 0..50 {
            let next = update(t, ProbeOutcome::Unreachable, &policy);
            assert!(next < t);
            assert!(next >= 0.0);
            t = next;
        }
    }

    #[test]
    fn test_mismatch_penalises_harder_than_unreachable() {
        let policy = TrustPolicy::default();
        let unreachable = update(0.9, ProbeOutcome::Unreachable, &policy);
        let mismatch = update(0.9, ProbeOutcome::Mismatch, &policy);
        assert!(mismatch < unreachable);
        assert!(approx(unreachable, 0.63));
        assert!(approx(mismatch, 0.36));
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let policy = TrustPolicy::default();
        assert!(update(7.0, ProbeOutcome::Success, &policy) <= MAX_TRUST);
        assert_eq!(update(-3.0, ProbeOutcome::Unreachable, &policy), 0.0);
        assert_eq!(update(f64::NAN, ProbeOutcome::Success, &policy), 0.2);
    }

    #[test]
    fn test_default_policy_is_valid() {
        assert!(TrustPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_constants() {
        let mut policy = TrustPolicy::default();
        policy.learning_rate = 0.0;
        assert!(policy.validate().is_err());

        let mut policy = TrustPolicy::default();
        policy.failure_decay = 0.1; // below learning rate
        assert!(policy.validate().is_err());

        let mut policy = TrustPolicy::default();
        policy.mismatch_decay = 0.25; // below failure decay
        assert!(policy.validate().is_err());

        let mut policy = TrustPolicy::default();
        policy.eviction_threshold = 0;
        assert!(policy.validate().is_err());

        let mut policy = TrustPolicy::default();
        policy.neutral_prior = 1.5;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_eviction_threshold() {
        let policy = TrustPolicy::default();
        assert!(!policy.should_evict(4));
        assert!(policy.should_evict(5));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let policy: TrustPolicy = toml::from_str("learning_rate = 0.1\n").unwrap();
        assert_eq!(policy.learning_rate, 0.1);
        assert_eq!(policy.failure_decay, 0.3);
        assert_eq!(policy.eviction_threshold, 5);
    }
}
