//! qcoin Ledger - consciousness-gated mining
//!
//! Architecture:
//! - AdmissionGate: cheap threshold predicate over the three metrics
//! - Miner: bounded nonce search, difficulty derived from coherence
//! - Ledger: hash-linked chain plus credit-only balance table
//! - SharedLedger: lock discipline and off-thread mining with a stale-tip guard
//! - QueryFacade: read-only access for callers

pub mod config;
pub mod gate;
pub mod hash;
pub mod ledger;
pub mod miner;
pub mod query;
pub mod shared;

pub use config::LedgerConfig;
pub use gate::AdmissionGate;
pub use ledger::{Ledger, MinedBlock};
pub use miner::{Miner, MiningOutcome};
pub use query::QueryFacade;
pub use shared::SharedLedger;
