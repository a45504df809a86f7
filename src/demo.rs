//! Scripted mining run: two identities, one of them mining repeatedly with
//! drifting metrics, then the chain statistics.

use qcoin_core::{ChainStats, MetricVector, RejectionReason};
use qcoin_ledger::{Ledger, LedgerConfig, SharedLedger};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct Attempt {
    pub identity: String,
    pub metrics: MetricVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub attempts: Vec<Attempt>,
    pub balances: Vec<(String, f64)>,
    pub statistics: ChainStats,
}

const ALICE: &str = "0x3e8a7f2c1d9b5e4a";
const BOB: &str = "0x7b4f9a1c6e2d8f3a";
const SUBJECT: &str = "dna::}{::lang";

pub async fn run(config: LedgerConfig) -> Report {
    let ledger = SharedLedger::new(Ledger::with_config(config));

    let alice = MetricVector::new(1.0234, 0.456789, 0.7441);
    let mut plan = vec![
        (ALICE, alice),
        (BOB, MetricVector::new(1.234, 0.523, 0.654)),
    ];
    for i in 0..3 {
        let step = i as f64;
        plan.push((
            ALICE,
            MetricVector::new(
                alice.integration() + step * 0.1,
                alice.coherence() + step * 0.05,
                (alice.decoherence() - step * 0.1).max(0.3),
            ),
        ));
    }
    // Below the integration threshold; shows a rejection in the report.
    plan.push((BOB, MetricVector::new(0.3, 0.9, 0.1)));

    let mut attempts = Vec::with_capacity(plan.len());
    for (identity, metrics) in plan {
        let attempt = match ledger.mine_block(identity, SUBJECT, metrics).await {
            Ok(mined) => {
                info!(
                    "{} mined block #{} (+{:.2})",
                    identity, mined.block.index, mined.reward
                );
                Attempt {
                    identity: identity.to_string(),
                    metrics,
                    block_index: Some(mined.block.index),
                    reward: Some(mined.reward),
                    nonce: Some(mined.block.nonce),
                    reason: None,
                }
            }
            Err(reason) => {
                info!("{} rejected: {}", identity, reason.as_str());
                Attempt {
                    identity: identity.to_string(),
                    metrics,
                    block_index: None,
                    reward: None,
                    nonce: None,
                    reason: Some(reason),
                }
            }
        };
        attempts.push(attempt);
    }

    let query = ledger.query();
    Report {
        attempts,
        balances: query
            .balances()
            .await
            .into_iter()
            .map(|(id, balance)| (id.to_string(), balance))
            .collect(),
        statistics: query.statistics().await,
    }
}
