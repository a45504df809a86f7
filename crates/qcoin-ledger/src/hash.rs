//! Canonical block encoding and SHA-256 digests.
//!
//! Encoding layout (all integers big-endian):
//!   u8  encoding version
//!   u64 index
//!   i64 timestamp, microseconds since the Unix epoch
//!   u32 len + utf-8 identity
//!   u32 len + utf-8 subject_id
//!   u64 integration bits, u64 coherence bits, u64 decoherence bits
//!   [u8; 32] previous digest
//!   u64 nonce
//!
//! The digest itself is never part of the input.

use qcoin_core::{BlockHeader, Digest};
use ring::digest::{digest as sha256, SHA256};

pub const ENCODING_VERSION: u8 = 1;

/// Byte offset of the nonce: everything before it is fixed for a header.
fn prefix_len(header: &BlockHeader) -> usize {
    1 + 8 + 8 + 4 + header.identity.as_str().len() + 4 + header.subject_id.len() + 24 + 32
}

/// Encode a header with nonce placeholder zero. The last 8 bytes are the nonce.
pub fn encode_header(header: &BlockHeader) -> Vec<u8> {
    let mut buf = Vec::with_capacity(prefix_len(header) + 8);
    buf.push(ENCODING_VERSION);
    buf.extend_from_slice(&header.index.to_be_bytes());
    buf.extend_from_slice(&header.timestamp.timestamp_micros().to_be_bytes());
    put_str(&mut buf, header.identity.as_str());
    put_str(&mut buf, &header.subject_id);
    buf.extend_from_slice(&header.metrics.integration().to_bits().to_be_bytes());
    buf.extend_from_slice(&header.metrics.coherence().to_bits().to_be_bytes());
    buf.extend_from_slice(&header.metrics.decoherence().to_bits().to_be_bytes());
    buf.extend_from_slice(header.previous_digest.as_bytes());
    buf.extend_from_slice(&0u64.to_be_bytes());
    buf
}

/// Overwrite the trailing nonce of a buffer produced by [`encode_header`].
pub fn set_nonce(buf: &mut [u8], nonce: u64) {
    let at = buf.len() - 8;
    buf[at..].copy_from_slice(&nonce.to_be_bytes());
}

pub fn encode(header: &BlockHeader, nonce: u64) -> Vec<u8> {
    let mut buf = encode_header(header);
    set_nonce(&mut buf, nonce);
    buf
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}

pub fn digest(bytes: &[u8]) -> Digest {
    let out = sha256(&SHA256, bytes);
    let mut arr = [0u8; 32];
    arr.copy_from_slice(out.as_ref());
    Digest::from_bytes(arr)
}

pub fn block_digest(header: &BlockHeader, nonce: u64) -> Digest {
    digest(&encode(header, nonce))
}
