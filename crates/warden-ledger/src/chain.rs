//! Hash-chain primitives: canonical hashing and per-record chain checks.
//!
//! A record's hash is computed over a fixed-field struct serialized with
//! serde_json, with every object inside `data` re-emitted in sorted key
//! order. Two logically equal records therefore hash identically no matter
//! how their maps were built.
//!
//! Hash input layout (canonical JSON, fields in this order):
//!   1. index
//!   2. timestamp as epoch milliseconds
//!   3. agentId
//!   4. action
//!   5. data (keys sorted recursively)
//!   6. prevHash
//!   7. hashKind
//!
//! Two digests are supported. `sha256` is used whenever the crate is built
//! with its default `sha256` feature. Without it, ledgers fall back to
//! `checksum32`, a 32-bit rolling multiplicative checksum (multiplier 31)
//! that only detects accidental corruption.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use warden_contracts::{
    agent::AgentId,
    error::WardenResult,
    record::{HashKind, LedgerRecord},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashableRecord<'a> {
    index: u64,
    timestamp: i64,
    agent_id: &'a AgentId,
    action: &'a str,
    data: Value,
    prev_hash: &'a str,
    hash_kind: HashKind,
}

/// Rebuild `value` with every object's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, item) in entries {
                sorted.insert(key.clone(), canonicalize(item));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// The digest kind this build prefers for new ledgers.
pub fn preferred_hash_kind() -> HashKind {
    if cfg!(feature = "sha256") {
        HashKind::Sha256
    } else {
        HashKind::Checksum32
    }
}

/// True when this build can produce and verify `kind` digests.
pub fn supports(kind: HashKind) -> bool {
    digest(kind, b"").is_some()
}

/// Rolling multiplicative checksum over raw bytes, wrapping at 32 bits.
pub fn checksum32(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(*b)))
}

/// Hex digest of `bytes`, or `None` when `kind` is unavailable in this build.
pub fn digest(kind: HashKind, bytes: &[u8]) -> Option<String> {
    match kind {
        HashKind::Sha256 => sha256_hex(bytes),
        HashKind::Checksum32 => Some(format!("{:08x}", checksum32(bytes))),
    }
}

#[cfg(feature = "sha256")]
fn sha256_hex(bytes: &[u8]) -> Option<String> {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Some(hex::encode(hasher.finalize()))
}

#[cfg(not(feature = "sha256"))]
fn sha256_hex(_bytes: &[u8]) -> Option<String> {
    None
}

/// Compute the hash for a record with the given fields.
///
/// Returns `Ok(None)` if `kind` is not supported by this build.
pub fn compute_hash(
    index: u64,
    timestamp: &DateTime<Utc>,
    agent_id: &AgentId,
    action: &str,
    data: &Value,
    prev_hash: &str,
    kind: HashKind,
) -> WardenResult<Option<String>> {
    let hashable = HashableRecord {
        index,
        timestamp: timestamp.timestamp_millis(),
        agent_id,
        action,
        data: canonicalize(data),
        prev_hash,
        hash_kind: kind,
    };
    let bytes = serde_json::to_vec(&hashable)?;
    Ok(digest(kind, &bytes))
}

/// Recompute a stored record's hash from its own fields.
pub fn recompute_hash(record: &LedgerRecord) -> WardenResult<Option<String>> {
    compute_hash(
        record.index,
        &record.timestamp,
        &record.agent_id,
        &record.action,
        &record.data,
        &record.prev_hash,
        record.hash_kind,
    )
}

// ── Chain checks ──────────────────────────────────────────────────────────────

/// Which chain rule a record violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    IndexGap,
    AgentMismatch,
    PrevHashMismatch,
    HashLength,
    UnsupportedHashKind,
    HashMismatch,
    TimestampRegression,
}

impl BreakKind {
    pub fn rule_id(self) -> &'static str {
        match self {
            BreakKind::IndexGap => "index-contiguity",
            BreakKind::AgentMismatch => "single-agent",
            BreakKind::PrevHashMismatch => "prev-hash-linkage",
            BreakKind::HashLength => "hash-length",
            BreakKind::UnsupportedHashKind => "hash-kind-supported",
            BreakKind::HashMismatch => "hash-recompute",
            BreakKind::TimestampRegression => "timestamp-order",
        }
    }
}

/// One rule violation at a chain position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBreak {
    /// The 1-based position the record occupies in the chain.
    pub position: u64,
    pub kind: BreakKind,
    pub message: String,
}

/// What the next record in a chain is expected to look like.
#[derive(Debug, Clone)]
pub struct Expectation<'a> {
    pub position: u64,
    pub prev_hash: &'a str,
    pub agent_id: Option<&'a AgentId>,
    pub not_before: Option<DateTime<Utc>>,
}

/// Check one record against every chain rule, returning all violations.
pub fn check_record(record: &LedgerRecord, expected: &Expectation<'_>) -> Vec<ChainBreak> {
    let mut breaks = Vec::new();
    let mut fail = |kind: BreakKind, message: String| {
        breaks.push(ChainBreak { position: expected.position, kind, message });
    };

    if record.index != expected.position {
        fail(
            BreakKind::IndexGap,
            format!("expected index {}, found {}", expected.position, record.index),
        );
    }

    if let Some(agent_id) = expected.agent_id {
        if &record.agent_id != agent_id {
            fail(
                BreakKind::AgentMismatch,
                format!("record belongs to '{}', chain belongs to '{}'", record.agent_id, agent_id),
            );
        }
    }

    if record.prev_hash != expected.prev_hash {
        fail(
            BreakKind::PrevHashMismatch,
            format!("prevHash {} does not match previous hash {}", record.prev_hash, expected.prev_hash),
        );
    }

    if record.hash.len() != record.hash_kind.digest_len() {
        fail(
            BreakKind::HashLength,
            format!(
                "{} hash must be {} hex chars, found {}",
                record.hash_kind.as_str(),
                record.hash_kind.digest_len(),
                record.hash.len()
            ),
        );
    }

    match recompute_hash(record) {
        Ok(Some(recomputed)) if recomputed == record.hash => {}
        Ok(Some(recomputed)) => fail(
            BreakKind::HashMismatch,
            format!("stored hash {} does not match recomputed {}", record.hash, recomputed),
        ),
        Ok(None) => fail(
            BreakKind::UnsupportedHashKind,
            format!("this build cannot verify {} hashes", record.hash_kind.as_str()),
        ),
        Err(e) => fail(BreakKind::HashMismatch, format!("record could not be re-hashed: {}", e)),
    }

    if let Some(not_before) = expected.not_before {
        if record.timestamp < not_before {
            fail(
                BreakKind::TimestampRegression,
                format!("timestamp {} precedes previous record", record.timestamp.timestamp_millis()),
            );
        }
    }

    breaks
}

/// Find the first record that breaks the chain, if any.
///
/// Everything from the returned position onward must be treated as
/// untrusted. An empty chain has no break.
pub fn find_break(records: &[LedgerRecord]) -> Option<ChainBreak> {
    let agent_id = records.first().map(|r| &r.agent_id);
    let mut prev_hash = warden_contracts::record::GENESIS_HASH;
    let mut not_before = None;

    for (i, record) in records.iter().enumerate() {
        let expected = Expectation {
            position: i as u64 + 1,
            prev_hash,
            agent_id,
            not_before,
        };
        if let Some(first) = check_record(record, &expected).into_iter().next() {
            return Some(first);
        }
        prev_hash = record.hash.as_str();
        not_before = Some(record.timestamp);
    }

    None
}

/// Verify the integrity of a hash chain.
///
/// Returns `true` when every record links to its predecessor (or to
/// `GENESIS_HASH`), carries a contiguous index, and hashes to its stored
/// value. An empty chain is valid.
pub fn verify_chain(records: &[LedgerRecord]) -> bool {
    find_break(records).is_none()
}
