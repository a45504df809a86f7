//! Ledger configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists. The defaults are the
//! constants the ledger has always used; changing them changes which chains
//! validate.

use qcoin_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Admission requires integration strictly above this.
pub const MIN_INTEGRATION: f64 = 0.5;
/// Admission requires coherence strictly above this.
pub const MIN_COHERENCE: f64 = 0.3;
/// Admission requires decoherence strictly below this.
pub const MAX_DECOHERENCE: f64 = 0.9;

/// Nonces tried before a search gives up.
pub const MAX_MINING_ATTEMPTS: u64 = 100_000;
/// Upper clamp on required leading zero hex digits.
pub const MAX_DIFFICULTY: u32 = 4;
/// Coherence is multiplied by this before flooring into a difficulty.
pub const DIFFICULTY_SCALE: f64 = 4.0;
/// Times a stale mining result is discarded and re-mined before giving up.
pub const MAX_STALE_RETRIES: u32 = 8;

/// Reward for a block before the integration bonus.
pub const BASE_REWARD: f64 = 10.0;
/// Reward grows by this fraction per unit of integration.
pub const INTEGRATION_BONUS: f64 = 0.1;

/// Top-level ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Admission thresholds.
    pub admission: AdmissionConfig,
    /// Nonce search bounds.
    pub mining: MiningConfig,
    /// Reward issuance.
    pub reward: RewardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub min_integration: f64,
    pub min_coherence: f64,
    pub max_decoherence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Hard bound on nonces tried per search.
    pub max_attempts: u64,
    /// Difficulty never exceeds this many leading zero hex digits.
    pub max_difficulty: u32,
    /// `difficulty = floor(coherence * difficulty_scale)`.
    pub difficulty_scale: f64,
    /// Compare-and-swap retries when the tail moves during a search.
    pub max_stale_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub base_reward: f64,
    /// `reward = base_reward * (1 + integration * integration_bonus)`.
    pub integration_bonus: f64,
}

// ============================================================
// Defaults
// ============================================================

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            min_integration: MIN_INTEGRATION,
            min_coherence: MIN_COHERENCE,
            max_decoherence: MAX_DECOHERENCE,
        }
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_MINING_ATTEMPTS,
            max_difficulty: MAX_DIFFICULTY,
            difficulty_scale: DIFFICULTY_SCALE,
            max_stale_retries: MAX_STALE_RETRIES,
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_reward: BASE_REWARD,
            integration_bonus: INTEGRATION_BONUS,
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl LedgerConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded ledger config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No ledger config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Strict parse: malformed TOML is an error rather than a fallback.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Render the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl RewardConfig {
    pub fn reward_for(&self, integration: f64) -> f64 {
        self.base_reward * (1.0 + integration * self.integration_bonus)
    }
}
