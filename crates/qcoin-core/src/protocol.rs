//! Wire shapes for the ledger's external operations
//!
//! Request (mine):
//!   { "identity": "alice", "subject_id": "s1",
//!     "metrics": { "integration": 1.0, "coherence": 0.9, "decoherence": 0.1 } }
//!
//! Response (accepted):
//!   { "accepted": true, "block": { ... }, "reward": 11.0, "balance": 11.0, ... }
//!
//! Response (rejected):
//!   { "accepted": false, "reason": "MetricsBelowThreshold" }

use crate::error::RejectionReason;
use crate::types::{Block, Identity, MetricVector};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Metrics as they arrive from a caller. Missing fields are kept as `None`
/// so they can be turned into a rejection instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsPayload {
    #[serde(default, alias = "phi")]
    pub integration: Option<f64>,
    #[serde(default, alias = "lambda")]
    pub coherence: Option<f64>,
    #[serde(default, alias = "gamma")]
    pub decoherence: Option<f64>,
}

impl MetricsPayload {
    /// Missing values become NaN, which the admission gate never accepts.
    pub fn to_metrics(&self) -> MetricVector {
        MetricVector::new(
            self.integration.unwrap_or(f64::NAN),
            self.coherence.unwrap_or(f64::NAN),
            self.decoherence.unwrap_or(f64::NAN),
        )
    }
}

/// Request body for a mining attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct MineRequest {
    pub identity: String,
    #[serde(default, alias = "organism_id")]
    pub subject_id: String,
    #[serde(default, alias = "consciousness_metrics")]
    pub metrics: MetricsPayload,
}

/// Query string for a balance lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceQuery {
    pub identity: String,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Outcome of a mining attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mining_duration_ms: Option<f64>,
}

impl MineResponse {
    pub fn accepted(block: Block, reward: f64, balance: f64) -> Self {
        Self {
            accepted: true,
            block: Some(block),
            reward: Some(reward),
            balance: Some(balance),
            reason: None,
            attempts: None,
            mining_duration_ms: None,
        }
    }

    pub fn rejected(reason: RejectionReason) -> Self {
        Self {
            accepted: false,
            block: None,
            reward: None,
            balance: None,
            reason: Some(reason),
            attempts: None,
            mining_duration_ms: None,
        }
    }

    pub fn with_timing(mut self, attempts: u64, duration_ms: f64) -> Self {
        self.attempts = Some(attempts);
        self.mining_duration_ms = Some(duration_ms);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub identity: Identity,
    pub balance: f64,
    pub currency: String,
}

impl BalanceResponse {
    pub fn new(identity: Identity, balance: f64) -> Self {
        Self {
            identity,
            balance,
            currency: CURRENCY.to_string(),
        }
    }
}

/// Ticker reported alongside balances.
pub const CURRENCY: &str = "QCOIN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub total_blocks: usize,
    pub blocks: Vec<Block>,
    pub total_supply: f64,
}

impl ChainResponse {
    pub fn new(blocks: Vec<Block>, total_supply: f64) -> Self {
        Self {
            total_blocks: blocks.len(),
            blocks,
            total_supply,
        }
    }
}

/// Mean metrics over every non-genesis block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub integration: f64,
    pub coherence: f64,
    pub decoherence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStats {
    pub total_blocks: usize,
    pub total_identities: usize,
    pub total_supply: f64,
    pub average_metrics: AverageMetrics,
    pub chain_valid: bool,
}
