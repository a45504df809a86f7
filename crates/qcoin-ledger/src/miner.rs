//! Bounded proof-of-work search

use crate::config::MiningConfig;
use crate::hash;
use qcoin_core::{BlockHeader, Digest, MetricVector};

/// Result of one nonce search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningOutcome {
    Found {
        nonce: u64,
        digest: Digest,
        attempts: u64,
    },
    Exhausted { attempts: u64 },
}

impl MiningOutcome {
    pub fn attempts(&self) -> u64 {
        match self {
            Self::Found { attempts, .. } | Self::Exhausted { attempts } => *attempts,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Miner {
    config: MiningConfig,
}

impl Miner {
    pub fn new(config: MiningConfig) -> Self {
        Self { config }
    }

    /// Required leading zero hex digits: `floor(coherence * scale)` clamped to
    /// `[0, max_difficulty]`. NaN maps to 0.
    pub fn difficulty_for(&self, metrics: &MetricVector) -> u32 {
        let raw = (metrics.coherence() * self.config.difficulty_scale).floor();
        if raw.is_nan() || raw <= 0.0 {
            return 0;
        }
        let max = self.config.max_difficulty;
        if raw >= max as f64 {
            max
        } else {
            raw as u32
        }
    }

    /// Try nonces `0..max_attempts` and return the first whose digest meets the
    /// difficulty for `header.metrics`.
    pub fn mine(&self, header: &BlockHeader) -> MiningOutcome {
        let difficulty = self.difficulty_for(&header.metrics);
        let mut buf = hash::encode_header(header);

        for nonce in 0..self.config.max_attempts {
            hash::set_nonce(&mut buf, nonce);
            let digest = hash::digest(&buf);
            if digest.meets_difficulty(difficulty) {
                return MiningOutcome::Found {
                    nonce,
                    digest,
                    attempts: nonce + 1,
                };
            }
        }

        MiningOutcome::Exhausted {
            attempts: self.config.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use qcoin_core::Identity;

    fn header(coherence: f64) -> BlockHeader {
        BlockHeader {
            index: 1,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap(),
            identity: Identity::new("miner-test"),
            subject_id: "subject".into(),
            metrics: MetricVector::new(1.0, coherence, 0.1),
            previous_digest: Digest::ZERO,
        }
    }

    #[test]
    fn difficulty_floors_and_clamps() {
        let m = Miner::default();
        let d = |c: f64| m.difficulty_for(&MetricVector::new(1.0, c, 0.1));
        assert_eq!(d(0.0), 0);
        assert_eq!(d(0.24), 0);
        assert_eq!(d(0.25), 1);
        assert_eq!(d(0.31), 1);
        assert_eq!(d(0.5), 2);
        assert_eq!(d(0.9), 3);
        assert_eq!(d(0.99), 3);
        assert_eq!(d(1.0), 4);
        assert_eq!(d(7.5), 4);
        assert_eq!(d(-1.0), 0);
        assert_eq!(d(f64::NAN), 0);
        assert_eq!(d(f64::INFINITY), 4);
    }

    #[test]
    fn zero_difficulty_takes_first_nonce() {
        let outcome = Miner::default().mine(&header(0.1));
        assert_eq!(outcome.attempts(), 1);
        match outcome {
            MiningOutcome::Found { nonce, .. } => assert_eq!(nonce, 0),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn found_digest_meets_difficulty_and_recomputes() {
        let h = header(0.6);
        match Miner::default().mine(&h) {
            MiningOutcome::Found { nonce, digest, .. } => {
                assert!(digest.leading_zero_digits() >= 2);
                assert_eq!(hash::block_digest(&h, nonce), digest);
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn search_is_deterministic() {
        let h = header(0.6);
        assert_eq!(Miner::default().mine(&h), Miner::default().mine(&h));
    }

    #[test]
    fn zero_budget_is_exhausted() {
        let miner = Miner::new(MiningConfig {
            max_attempts: 0,
            ..Default::default()
        });
        assert_eq!(
            miner.mine(&header(0.0)),
            MiningOutcome::Exhausted { attempts: 0 }
        );
    }
}
