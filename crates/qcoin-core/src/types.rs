//! Core types for qcoin

use chrono::{DateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Error;

/// Identity naming a ledger participant - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct Identity(Arc<str>);

impl Identity {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Identity::from)
    }
}

/// The three-number admission and reward signal.
///
/// No range checks happen here; the admission gate decides what is acceptable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricVector {
    #[serde(alias = "phi")]
    integration: f64,
    #[serde(alias = "lambda")]
    coherence: f64,
    #[serde(alias = "gamma")]
    decoherence: f64,
}

impl MetricVector {
    pub const fn new(integration: f64, coherence: f64, decoherence: f64) -> Self {
        Self {
            integration,
            coherence,
            decoherence,
        }
    }

    pub fn integration(&self) -> f64 {
        self.integration
    }

    pub fn coherence(&self) -> f64 {
        self.coherence
    }

    pub fn decoherence(&self) -> f64 {
        self.decoherence
    }

    pub fn is_finite(&self) -> bool {
        self.integration.is_finite() && self.coherence.is_finite() && self.decoherence.is_finite()
    }
}

/// A 256-bit digest. Rendered as `0x` followed by 64 lowercase hex characters.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct Digest([u8; 32]);

impl Digest {
    pub const ZERO: Digest = Digest([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 64 lowercase hex characters, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Number of leading `'0'` characters in the hex rendering.
    pub fn leading_zero_digits(&self) -> u32 {
        self.to_hex().chars().take_while(|c| *c == '0').count() as u32
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zero_digits() >= difficulty
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        if body.len() != 64 {
            return Err(Error::InvalidDigest(format!(
                "expected 64 hex characters, got {}",
                body.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(body, &mut bytes).map_err(|e| Error::InvalidDigest(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Every field of a block except the nonce and the digest.
///
/// This is what the miner searches over: the nonce varies, the header does not.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockHeader {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub identity: Identity,
    pub subject_id: String,
    pub metrics: MetricVector,
    pub previous_digest: Digest,
}

/// A block as stored in the chain and returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub identity: Identity,
    pub subject_id: String,
    pub metrics: MetricVector,
    pub previous_digest: Digest,
    pub nonce: u64,
    pub digest: Digest,
}

/// Identity credited by the genesis block. Never receives a reward.
pub const GENESIS_IDENTITY: &str = "0x0000000000000000";
/// Subject recorded on the genesis block.
pub const GENESIS_SUBJECT: &str = "dna::}{::lang";

fn genesis_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

impl Block {
    /// The fixed first block: sentinel digests, zero metrics except decoherence.
    pub fn genesis() -> Self {
        Self {
            index: 0,
            timestamp: genesis_timestamp(),
            identity: Identity::new(GENESIS_IDENTITY),
            subject_id: GENESIS_SUBJECT.to_string(),
            metrics: MetricVector::new(0.0, 0.0, 1.0),
            previous_digest: Digest::ZERO,
            nonce: 0,
            digest: Digest::ZERO,
        }
    }

    pub fn from_header(header: BlockHeader, nonce: u64, digest: Digest) -> Self {
        Self {
            index: header.index,
            timestamp: header.timestamp,
            identity: header.identity,
            subject_id: header.subject_id,
            metrics: header.metrics,
            previous_digest: header.previous_digest,
            nonce,
            digest,
        }
    }

    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            index: self.index,
            timestamp: self.timestamp,
            identity: self.identity.clone(),
            subject_id: self.subject_id.clone(),
            metrics: self.metrics,
            previous_digest: self.previous_digest,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

/// Gateway configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bind: BindMode,
}

fn default_port() -> u16 {
    18800
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: BindMode::default(),
        }
    }
}

/// Bind mode for the gateway
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    #[default]
    Loopback,
    Lan,
}

impl BindMode {
    pub fn to_addr(&self) -> &str {
        match self {
            BindMode::Loopback => "127.0.0.1",
            BindMode::Lan => "0.0.0.0",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "lan" | "0.0.0.0" => BindMode::Lan,
            _ => BindMode::Loopback,
        }
    }
}
