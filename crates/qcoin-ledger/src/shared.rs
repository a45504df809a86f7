//! Shared, concurrently accessible ledger handle
//!
//! Reads take the read lock and see a consistent chain. Mining runs on a
//! blocking worker without any lock held; its result is applied under the
//! write lock only if the chain tail has not moved in the meantime. A stale
//! result is thrown away and the search starts over against the new tail.

use crate::ledger::{Ledger, MinedBlock};
use crate::miner::MiningOutcome;
use crate::query::QueryFacade;
use qcoin_core::{Block, FaultKind, Identity, MetricVector, RejectionReason};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, error, warn};

#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl Default for SharedLedger {
    fn default() -> Self {
        Self::new(Ledger::new())
    }
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Read-only view over the same ledger.
    pub fn query(&self) -> QueryFacade {
        QueryFacade::new(self.clone())
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read().await
    }

    pub async fn mine_block(
        &self,
        identity: impl Into<Identity>,
        subject_id: impl Into<String>,
        metrics: MetricVector,
    ) -> Result<MinedBlock, RejectionReason> {
        let identity = identity.into();
        let subject_id = subject_id.into();

        let (gate, miner, max_retries, credit) = {
            let ledger = self.inner.read().await;
            (
                ledger.gate().clone(),
                ledger.miner().clone(),
                ledger.config().mining.max_stale_retries,
                ledger.credit_for(&identity, metrics.integration()),
            )
        };

        if let Err(reason) = gate.evaluate(&metrics) {
            debug!("Rejected {}: {}", identity, reason);
            return Err(reason);
        }
        if credit.is_none() {
            debug!("Rejected {}: reward would overflow", identity);
            return Err(RejectionReason::MalformedInput);
        }

        let started = Instant::now();
        let mut attempts = 0u64;

        for retry in 0..=max_retries {
            let header = self
                .inner
                .read()
                .await
                .next_header(identity.clone(), subject_id.clone(), metrics);

            let worker = miner.clone();
            let candidate = header.clone();
            let task = tokio::task::spawn_blocking(move || worker.mine(&candidate));
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Mining worker for {} failed: {}", identity, e);
                    return Err(RejectionReason::InternalFault);
                }
            };
            attempts += outcome.attempts();

            let (nonce, digest) = match outcome {
                MiningOutcome::Found { nonce, digest, .. } => (nonce, digest),
                MiningOutcome::Exhausted { attempts } => {
                    debug!(
                        "Mining exhausted for {} after {} attempts",
                        identity, attempts
                    );
                    return Err(RejectionReason::MiningExhausted);
                }
            };

            let block = Block::from_header(header, nonce, digest);
            let mut ledger = self.inner.write().await;
            match ledger.append(block.clone()) {
                Ok((reward, balance)) => {
                    return Ok(MinedBlock {
                        block,
                        reward,
                        balance,
                        attempts,
                        mining_duration: started.elapsed(),
                    });
                }
                Err(fault) if fault.is_stale() => {
                    warn!(
                        "Discarding stale block #{} for {} ({}), retry {}/{}",
                        block.index, identity, fault, retry + 1, max_retries
                    );
                }
                // Another block credited this identity while we were mining.
                Err(fault) if fault.kind == FaultKind::RewardOverflow => {
                    debug!("Rejected {}: {}", identity, fault);
                    return Err(RejectionReason::MalformedInput);
                }
                Err(fault) => {
                    error!(
                        "Mined block #{} for {} failed its own checks: {}",
                        block.index, identity, fault
                    );
                    return Err(RejectionReason::InternalFault);
                }
            }
        }

        Err(RejectionReason::ChainContended)
    }
}
