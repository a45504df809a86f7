//! Error types for qcoin

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Infrastructure failures: configuration, I/O, encoding, serving.
#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("bind error: {addr} - {message}")]
    BindError { addr: String, message: String },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn bind_error(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BindError {
            addr: addr.into(),
            message: message.into(),
        }
    }
}

/// Why a mining attempt did not produce a block.
///
/// Every variant leaves the ledger untouched. Serializes as the bare variant
/// name, which is also the `reason` string on the wire.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    #[error("metrics below admission threshold")]
    MetricsBelowThreshold,

    /// Also covers a reward or balance that would leave the finite range.
    #[error("metrics missing or not finite")]
    MalformedInput,

    #[error("nonce search exhausted without meeting difficulty")]
    MiningExhausted,

    #[error("chain advanced during every mining retry")]
    ChainContended,

    /// The mining worker died or a freshly mined block failed its own checks.
    #[error("internal mining fault")]
    InternalFault,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetricsBelowThreshold => "MetricsBelowThreshold",
            Self::MalformedInput => "MalformedInput",
            Self::MiningExhausted => "MiningExhausted",
            Self::ChainContended => "ChainContended",
            Self::InternalFault => "InternalFault",
        }
    }

    /// Retrying with the same inputs can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MiningExhausted | Self::ChainContended)
    }
}

/// What went wrong at a particular block during chain validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    GenesisMismatch,
    IndexGap,
    BrokenLink,
    DigestMismatch,
    InsufficientWork,
    AdmissionViolated,
    /// Crediting the block would push a balance or the supply out of the
    /// finite range.
    RewardOverflow,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error("chain fault at block {index}: {kind:?}")]
pub struct ChainFault {
    pub index: u64,
    pub kind: FaultKind,
}

impl ChainFault {
    pub fn new(index: u64, kind: FaultKind) -> Self {
        Self { index, kind }
    }

    /// The block was built against a tail that is no longer the tail.
    pub fn is_stale(&self) -> bool {
        matches!(self.kind, FaultKind::IndexGap | FaultKind::BrokenLink)
    }
}
