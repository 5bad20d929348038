//! Core trait definitions for the Warden governance pipeline.
//!
//! These four traits are the seams between the governor and its
//! collaborators:
//!
//! - `Ledger`: per-agent, append-only hash chain (the record of truth)
//! - `Detector`: stateless anomaly rules run after each record
//! - `ApprovalGate`: external verdict for risky tool calls
//! - `AuditSink`: best-effort destination for structured events
//!
//! The governor wires them together; it never inspects their internals.

use std::sync::Arc;

use serde_json::Value;

use warden_contracts::{
    agent::AgentId,
    approval::ApprovalRequest,
    entry::{AlertEntry, ToolCallEntry},
    error::WardenResult,
    event::SinkEvent,
    record::LedgerRecord,
};

/// An append-only, hash-chained sequence of records owned by one agent.
///
/// Implementations must serialize `append`: reading the previous hash and
/// index and writing the new ones is one logical step.
pub trait Ledger: Send + Sync {
    /// The agent every record in this ledger belongs to.
    fn agent_id(&self) -> &AgentId;

    /// Commit `data` as the next record under `action`.
    ///
    /// Returns the committed record. There is no rollback: once this returns
    /// `Ok`, the record is part of the chain.
    fn append(&self, action: &str, data: Value) -> WardenResult<LedgerRecord>;
}

/// Anomaly rules evaluated against decisions and tool calls.
///
/// Implementations hold only static configuration. Returning `None` means
/// nothing was anomalous.
pub trait Detector: Send + Sync {
    fn analyze_decision(
        &self,
        agent_id: &AgentId,
        confidence: f64,
        context: &Value,
    ) -> Option<AlertEntry>;

    fn analyze_tool_call(&self, agent_id: &AgentId, entry: &ToolCallEntry) -> Option<AlertEntry>;
}

/// The external approval collaborator.
///
/// `Ok(true)` approves, `Ok(false)` denies. An `Err` is treated as a denial
/// by the governor. Timeouts are the collaborator's own concern.
pub trait ApprovalGate: Send + Sync {
    fn request_approval(&self, request: &ApprovalRequest) -> WardenResult<bool>;
}

/// A destination for structured audit events.
///
/// Delivery is best-effort. Callers log failures and carry on; nothing in the
/// chain depends on the sink being reachable.
pub trait AuditSink: Send + Sync {
    fn submit(&self, event: &SinkEvent) -> WardenResult<()>;
}

impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    fn agent_id(&self) -> &AgentId {
        (**self).agent_id()
    }

    fn append(&self, action: &str, data: Value) -> WardenResult<LedgerRecord> {
        (**self).append(action, data)
    }
}

impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn submit(&self, event: &SinkEvent) -> WardenResult<()> {
        (**self).submit(event)
    }
}
