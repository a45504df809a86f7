//! Read-only accessors for external callers. Nothing here mutates the ledger.

use crate::shared::SharedLedger;
use qcoin_core::{Block, ChainFault, ChainResponse, ChainStats, Identity};

#[derive(Clone, Debug)]
pub struct QueryFacade {
    ledger: SharedLedger,
}

impl QueryFacade {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }

    /// Zero for identities that were never credited.
    pub async fn balance_of(&self, identity: &Identity) -> f64 {
        self.ledger.read().await.balance_of(identity)
    }

    pub async fn chain_snapshot(&self) -> Vec<Block> {
        self.ledger.read().await.chain_snapshot()
    }

    pub async fn chain_len(&self) -> usize {
        self.ledger.read().await.chain_len()
    }

    pub async fn total_supply(&self) -> f64 {
        self.ledger.read().await.total_supply()
    }

    /// Blocks and supply read under a single lock.
    pub async fn chain(&self) -> ChainResponse {
        let ledger = self.ledger.read().await;
        ChainResponse::new(ledger.chain_snapshot(), ledger.total_supply())
    }

    pub async fn statistics(&self) -> ChainStats {
        self.ledger.read().await.statistics()
    }

    pub async fn validate_chain(&self) -> Result<(), ChainFault> {
        self.ledger.read().await.validate_chain()
    }

    /// Every credited identity with its balance, sorted by identity.
    pub async fn balances(&self) -> Vec<(Identity, f64)> {
        let ledger = self.ledger.read().await;
        ledger.balances().map(|(k, v)| (k.clone(), v)).collect()
    }
}
