//! Append-only block chain plus the per-identity balance table
//!
//! The ledger owns both halves. A successful mine appends exactly one block and
//! credits exactly one balance; every rejection leaves both untouched.

use crate::config::LedgerConfig;
use crate::gate::AdmissionGate;
use crate::hash;
use crate::miner::{Miner, MiningOutcome};
use chrono::{SubsecRound, Utc};
use qcoin_core::{
    AverageMetrics, Block, BlockHeader, ChainFault, ChainStats, Digest, FaultKind, Identity,
    MetricVector, RejectionReason,
};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// A block that made it onto the chain, with what it paid out.
#[derive(Debug, Clone, PartialEq)]
pub struct MinedBlock {
    pub block: Block,
    pub reward: f64,
    /// Beneficiary's balance after the credit.
    pub balance: f64,
    pub attempts: u64,
    pub mining_duration: Duration,
}

#[derive(Debug)]
pub struct Ledger {
    config: LedgerConfig,
    gate: AdmissionGate,
    miner: Miner,
    blocks: Vec<Block>,
    balances: BTreeMap<Identity, f64>,
    /// Running sum of rewards in chain order.
    supply: f64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            gate: AdmissionGate::new(config.admission.clone()),
            miner: Miner::new(config.mining.clone()),
            config,
            blocks: vec![Block::genesis()],
            balances: BTreeMap::new(),
            supply: 0.0,
        }
    }

    /// Rebuild a ledger from a previously exported chain.
    ///
    /// The chain must validate under `config`; balances are re-derived by
    /// replaying the reward for every non-genesis block.
    pub fn from_blocks(config: LedgerConfig, blocks: Vec<Block>) -> Result<Self, ChainFault> {
        let mut ledger = Self::with_config(config);
        if blocks.first() != Some(&Block::genesis()) {
            return Err(ChainFault::new(0, FaultKind::GenesisMismatch));
        }
        for block in blocks.into_iter().skip(1) {
            ledger.append(block)?;
        }
        Ok(ledger)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn miner(&self) -> &Miner {
        &self.miner
    }

    pub fn tail(&self) -> &Block {
        // The genesis block is never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn tail_digest(&self) -> Digest {
        self.tail().digest
    }

    /// Header for the block that would come next, stamped now.
    pub fn next_header(
        &self,
        identity: Identity,
        subject_id: String,
        metrics: MetricVector,
    ) -> BlockHeader {
        BlockHeader {
            index: self.blocks.len() as u64,
            timestamp: Utc::now().trunc_subsecs(6),
            identity,
            subject_id,
            metrics,
            previous_digest: self.tail_digest(),
        }
    }

    /// Reward for a block with this `integration` and the identity's balance
    /// after it. `None` when the reward, the balance or the total supply would
    /// not be finite.
    pub fn credit_for(&self, identity: &Identity, integration: f64) -> Option<(f64, f64)> {
        let reward = self.config.reward.reward_for(integration);
        let balance = self.balance_of(identity) + reward;
        let supply = self.supply + reward;
        let finite = reward.is_finite() && balance.is_finite() && supply.is_finite();
        finite.then_some((reward, balance))
    }

    /// Gate, mine and append in one step.
    pub fn mine_block(
        &mut self,
        identity: impl Into<Identity>,
        subject_id: impl Into<String>,
        metrics: MetricVector,
    ) -> Result<MinedBlock, RejectionReason> {
        let identity = identity.into();
        if let Err(reason) = self.gate.evaluate(&metrics) {
            debug!("Rejected {}: {}", identity, reason);
            return Err(reason);
        }
        let integration = metrics.integration();
        if self.credit_for(&identity, integration).is_none() {
            debug!("Rejected {}: reward would overflow", identity);
            return Err(RejectionReason::MalformedInput);
        }

        let header = self.next_header(identity, subject_id.into(), metrics);
        let started = Instant::now();
        let outcome = self.miner.mine(&header);
        let mining_duration = started.elapsed();

        match outcome {
            MiningOutcome::Found {
                nonce,
                digest,
                attempts,
            } => {
                let block = Block::from_header(header, nonce, digest);
                let appended = self.append(block.clone());
                debug_assert!(appended.is_ok(), "mined block rejected: {:?}", appended);
                match appended {
                    Ok((reward, balance)) => Ok(MinedBlock {
                        block,
                        reward,
                        balance,
                        attempts,
                        mining_duration,
                    }),
                    Err(fault) => {
                        error!(
                            "Mined block #{} failed its own checks: {}",
                            block.index, fault
                        );
                        Err(RejectionReason::InternalFault)
                    }
                }
            }
            MiningOutcome::Exhausted { attempts } => {
                debug!(
                    "Mining exhausted for {} after {} attempts",
                    header.identity, attempts
                );
                Err(RejectionReason::MiningExhausted)
            }
        }
    }

    /// Append a mined block and credit its identity.
    ///
    /// This is the compare-and-swap point: the block must extend the current
    /// tail exactly, carry a digest that recomputes from its fields, meet its
    /// difficulty, pass admission and keep the credit finite. Nothing changes
    /// on error.
    pub fn append(&mut self, block: Block) -> Result<(f64, f64), ChainFault> {
        self.check_successor(self.tail(), &block)?;

        let (reward, balance) = self
            .credit_for(&block.identity, block.metrics.integration())
            .ok_or_else(|| ChainFault::new(block.index, FaultKind::RewardOverflow))?;
        self.balances.insert(block.identity.clone(), balance);
        self.supply += reward;

        info!(
            "Mined block #{} for {} (nonce={}, digest={}, reward={:.4}, balance={:.4})",
            block.index, block.identity, block.nonce, block.digest, reward, balance
        );
        self.blocks.push(block);
        Ok((reward, balance))
    }

    fn check_successor(&self, prev: &Block, block: &Block) -> Result<(), ChainFault> {
        let at = |kind| ChainFault::new(block.index, kind);

        if block.index != prev.index + 1 {
            return Err(at(FaultKind::IndexGap));
        }
        if block.previous_digest != prev.digest {
            return Err(at(FaultKind::BrokenLink));
        }
        if hash::block_digest(&block.header(), block.nonce) != block.digest {
            return Err(at(FaultKind::DigestMismatch));
        }
        if !block.digest.meets_difficulty(self.miner.difficulty_for(&block.metrics)) {
            return Err(at(FaultKind::InsufficientWork));
        }
        if !self.gate.qualifies(&block.metrics) {
            return Err(at(FaultKind::AdmissionViolated));
        }
        Ok(())
    }

    /// Re-check every invariant over the whole chain.
    pub fn validate_chain(&self) -> Result<(), ChainFault> {
        if self.blocks.first() != Some(&Block::genesis()) {
            return Err(ChainFault::new(0, FaultKind::GenesisMismatch));
        }
        for pair in self.blocks.windows(2) {
            self.check_successor(&pair[0], &pair[1])?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn balance_of(&self, identity: &Identity) -> f64 {
        self.balances.get(identity).copied().unwrap_or(0.0)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn chain_len(&self) -> usize {
        self.blocks.len()
    }

    pub fn total_supply(&self) -> f64 {
        self.supply
    }

    /// Credited identities in identity order.
    pub fn balances(&self) -> impl Iterator<Item = (&Identity, f64)> {
        self.balances.iter().map(|(k, v)| (k, *v))
    }

    pub fn statistics(&self) -> ChainStats {
        let mined = &self.blocks[1..];
        let average_metrics = if mined.is_empty() {
            AverageMetrics::default()
        } else {
            let n = mined.len() as f64;
            AverageMetrics {
                integration: mined.iter().map(|b| b.metrics.integration()).sum::<f64>() / n,
                coherence: mined.iter().map(|b| b.metrics.coherence()).sum::<f64>() / n,
                decoherence: mined.iter().map(|b| b.metrics.decoherence()).sum::<f64>() / n,
            }
        };

        ChainStats {
            total_blocks: self.blocks.len(),
            total_identities: self.balances.len(),
            total_supply: self.total_supply(),
            average_metrics,
            chain_valid: self.validate_chain().is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewardConfig;

    fn good() -> MetricVector {
        MetricVector::new(1.0, 0.6, 0.1)
    }

    #[test]
    fn tampered_digest_is_detected() {
        let mut ledger = Ledger::new();
        ledger.mine_block("alice", "s1", good()).unwrap();
        ledger.blocks[1].subject_id = "forged".into();
        assert_eq!(
            ledger.validate_chain(),
            Err(ChainFault::new(1, FaultKind::DigestMismatch))
        );
    }

    #[test]
    fn tampered_link_is_detected() {
        let mut ledger = Ledger::new();
        ledger.mine_block("alice", "s1", good()).unwrap();
        ledger.mine_block("alice", "s2", good()).unwrap();
        ledger.blocks[2].previous_digest = Digest::from_bytes([7u8; 32]);
        assert_eq!(
            ledger.validate_chain(),
            Err(ChainFault::new(2, FaultKind::BrokenLink))
        );
        assert!(!ledger.statistics().chain_valid);
    }

    #[test]
    fn tampered_genesis_is_detected() {
        let mut ledger = Ledger::new();
        ledger.blocks[0].nonce = 1;
        assert_eq!(
            ledger.validate_chain(),
            Err(ChainFault::new(0, FaultKind::GenesisMismatch))
        );
    }

    #[test]
    fn append_rejects_stale_block_without_side_effects() {
        let mut ledger = Ledger::new();
        let header = ledger.next_header("alice".into(), "s1".into(), good());
        let stale = match ledger.miner().mine(&header) {
            MiningOutcome::Found { nonce, digest, .. } => {
                Block::from_header(header, nonce, digest)
            }
            other => panic!("expected Found, got {:?}", other),
        };
        ledger.mine_block("bob", "s2", good()).unwrap();

        let before = ledger.total_supply();
        let fault = ledger.append(stale).unwrap_err();
        assert_eq!(fault, ChainFault::new(1, FaultKind::IndexGap));
        assert!(fault.is_stale());
        assert_eq!(ledger.chain_len(), 2);
        assert_eq!(ledger.total_supply(), before);
        assert_eq!(ledger.balance_of(&"alice".into()), 0.0);
    }

    #[test]
    fn credit_stays_finite() {
        let mut ledger = Ledger::new();
        let alice = Identity::new("alice");
        assert_eq!(ledger.credit_for(&alice, 1.0), Some((11.0, 11.0)));
        assert_eq!(ledger.credit_for(&alice, f64::INFINITY), None);

        ledger.balances.insert(alice.clone(), f64::MAX);
        assert_eq!(ledger.credit_for(&alice, 1e300), None);
        assert_eq!(ledger.credit_for(&"bob".into(), 1.0), Some((11.0, 11.0)));
    }

    #[test]
    fn append_refuses_overflowing_credit() {
        let mut ledger = Ledger::new();
        ledger.mine_block("alice", "s1", good()).unwrap();
        let blocks = ledger.chain_snapshot();

        let huge = LedgerConfig {
            reward: RewardConfig {
                base_reward: f64::MAX,
                integration_bonus: 1.0,
            },
            ..Default::default()
        };
        let fault = Ledger::from_blocks(huge, blocks).unwrap_err();
        assert_eq!(fault, ChainFault::new(1, FaultKind::RewardOverflow));
        assert!(!fault.is_stale());
    }
}
