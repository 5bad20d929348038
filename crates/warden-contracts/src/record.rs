//! Ledger records and exported chains.
//!
//! A `LedgerRecord` wraps one entry (or any structured value) with its
//! position in an agent's chain and the hash that links it to everything
//! before it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{agent::AgentId, entry::Entry, error::WardenResult};

/// The `prev_hash` of the first record in every chain.
///
/// 64 hex zeros, the same width as a SHA-256 digest.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Which digest produced a record's `hash`.
///
/// Carried on every record so a verifier knows which integrity guarantee
/// applies. `Checksum32` is a non-cryptographic fallback and must never be
/// mistaken for a SHA-256 chain; its hashes are 8 hex chars instead of 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Sha256,
    Checksum32,
}

impl HashKind {
    /// Length of a hex-encoded digest of this kind.
    pub fn digest_len(self) -> usize {
        match self {
            HashKind::Sha256 => 64,
            HashKind::Checksum32 => 8,
        }
    }

    pub fn is_cryptographic(self) -> bool {
        matches!(self, HashKind::Sha256)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashKind::Sha256 => "sha256",
            HashKind::Checksum32 => "checksum32",
        }
    }
}

/// One link in an agent's hash chain.
///
/// `hash` commits to every other field, including `prev_hash`, so changing
/// any historical record invalidates its own hash and the linkage of every
/// record after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    /// 1-based, contiguous position in the chain.
    pub index: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    /// The wrapped entry's type name (e.g. "DECISION", "TOOL_CALL").
    pub action: String,
    pub data: Value,
    pub prev_hash: String,
    pub hash: String,
    pub hash_kind: HashKind,
}

impl LedgerRecord {
    /// Decode `data` back into a typed entry.
    ///
    /// Fails for records whose payload is not one of the entry types.
    pub fn entry(&self) -> WardenResult<Entry> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// A snapshot of one agent's full chain, suitable for handing to an
/// external verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExport {
    pub agent_id: AgentId,
    pub hash_kind: HashKind,
    /// All records in chain order (index 1 first).
    pub records: Vec<LedgerRecord>,
    /// `hash` of the last record, or `None` for an empty chain.
    pub head_hash: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub exported_at: DateTime<Utc>,
}
