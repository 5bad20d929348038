//! In-memory implementation of `Ledger`.
//!
//! `AgentLedger` is the reference per-agent ledger. All chain state lives in
//! one `Mutex`, so reading the previous hash and index, hashing, and
//! publishing the new record is a single serialized step even when the
//! owning governor is shared across threads.
//!
//! Appends happen in two phases: commit under the lock, then, with the lock
//! released, forward a `LEDGER` event to the optional audit sink. A sink
//! failure is logged and never touches the chain.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use warden_contracts::{
    agent::AgentId,
    entry::now_millis,
    error::{WardenError, WardenResult},
    event::{EventLevel, EventType, SinkEvent},
    record::{HashKind, LedgerExport, LedgerRecord, GENESIS_HASH},
};
use warden_core::{
    sink::forward,
    traits::{AuditSink, Ledger},
};

use crate::chain::{compute_hash, preferred_hash_kind, supports, verify_chain};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `AgentLedger`.
pub(crate) struct LedgerState {
    /// All records committed so far, in chain order.
    pub(crate) records: Vec<LedgerRecord>,

    /// Index of the last committed record (0 before the first append).
    pub(crate) index: u64,

    /// `hash` of the last committed record, or `GENESIS_HASH`.
    pub(crate) last_hash: String,
}

// ── Public ledger ─────────────────────────────────────────────────────────────

/// An append-only, hash-chained ledger owned by one agent.
pub struct AgentLedger {
    agent_id: AgentId,
    hash_kind: HashKind,
    sink: Option<Arc<dyn AuditSink>>,
    pub(crate) state: Mutex<LedgerState>,
}

impl AgentLedger {
    /// Create an empty ledger using the strongest digest this build offers.
    pub fn new(agent_id: AgentId) -> Self {
        Self::build(agent_id, preferred_hash_kind())
    }

    /// Create an empty ledger with an explicit digest.
    ///
    /// Returns `WardenError::ConfigError` if this build cannot produce
    /// `hash_kind` digests.
    pub fn with_hash_kind(agent_id: AgentId, hash_kind: HashKind) -> WardenResult<Self> {
        if !supports(hash_kind) {
            return Err(WardenError::ConfigError {
                reason: format!("hash kind '{}' is not available in this build", hash_kind.as_str()),
            });
        }
        Ok(Self::build(agent_id, hash_kind))
    }

    fn build(agent_id: AgentId, hash_kind: HashKind) -> Self {
        Self {
            agent_id,
            hash_kind,
            sink: None,
            state: Mutex::new(LedgerState {
                records: Vec::new(),
                index: 0,
                last_hash: GENESIS_HASH.to_string(),
            }),
        }
    }

    /// Forward every committed record to `sink` as a `LEDGER` event.
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn hash_kind(&self) -> HashKind {
        self.hash_kind
    }

    /// Index of the last committed record; 0 when empty.
    pub fn len(&self) -> u64 {
        self.state.lock().map(|s| s.index).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `hash` of the last record, or `GENESIS_HASH` when empty.
    pub fn head_hash(&self) -> String {
        self.state
            .lock()
            .map(|s| s.last_hash.clone())
            .unwrap_or_else(|_| GENESIS_HASH.to_string())
    }

    /// A copy of every record, in chain order.
    pub fn records(&self) -> WardenResult<Vec<LedgerRecord>> {
        Ok(self.lock_state()?.records.clone())
    }

    /// Snapshot the whole chain for external verification.
    pub fn export(&self) -> WardenResult<LedgerExport> {
        let state = self.lock_state()?;
        Ok(LedgerExport {
            agent_id: self.agent_id.clone(),
            hash_kind: self.hash_kind,
            records: state.records.clone(),
            head_hash: state.records.last().map(|r| r.hash.clone()),
            exported_at: now_millis(),
        })
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        match self.state.lock() {
            Ok(state) => verify_chain(&state.records),
            Err(_) => false,
        }
    }

    fn lock_state(&self) -> WardenResult<std::sync::MutexGuard<'_, LedgerState>> {
        self.state.lock().map_err(|e| WardenError::LedgerAppendFailed {
            reason: format!("ledger state lock poisoned: {}", e),
        })
    }
}

// ── Ledger impl ───────────────────────────────────────────────────────────────

impl Ledger for AgentLedger {
    fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Commit `data` as the next record.
    ///
    /// The record timestamp never precedes the previous record's, so a wall
    /// clock stepping backwards cannot reorder the chain.
    fn append(&self, action: &str, data: Value) -> WardenResult<LedgerRecord> {
        if action.trim().is_empty() {
            return Err(WardenError::InvalidEntry {
                reason: "ledger action must not be empty".to_string(),
            });
        }

        let record = {
            let mut state = self.lock_state()?;

            let index = state.index + 1;
            let prev_hash = state.last_hash.clone();
            let now = now_millis();
            let timestamp = match state.records.last() {
                Some(last) if last.timestamp > now => last.timestamp,
                _ => now,
            };

            let hash = compute_hash(
                index,
                &timestamp,
                &self.agent_id,
                action,
                &data,
                &prev_hash,
                self.hash_kind,
            )
            .map_err(|e| WardenError::LedgerAppendFailed {
                reason: format!("record could not be hashed: {}", e),
            })?
            .ok_or_else(|| WardenError::LedgerAppendFailed {
                reason: format!("hash kind '{}' unavailable", self.hash_kind.as_str()),
            })?;

            let record = LedgerRecord {
                index,
                timestamp,
                agent_id: self.agent_id.clone(),
                action: action.to_string(),
                data,
                prev_hash,
                hash: hash.clone(),
                hash_kind: self.hash_kind,
            };

            state.records.push(record.clone());
            state.index = index;
            state.last_hash = hash;
            record
        };

        debug!(
            agent_id = %self.agent_id,
            index = record.index,
            action = %record.action,
            hash = %record.hash,
            "record appended"
        );

        if let Some(sink) = &self.sink {
            match serde_json::to_value(&record) {
                Ok(payload) => forward(
                    sink.as_ref(),
                    SinkEvent::new(self.agent_id.clone(), EventType::Ledger, EventLevel::Info, payload),
                ),
                Err(e) => warn!(agent_id = %self.agent_id, error = %e, "ledger event not forwarded"),
            }
        }

        Ok(record)
    }
}
