//! The entry model: decisions, tool calls, communications, and alerts.
//!
//! These are the records an agent produces and the ledger wraps. Constructors
//! reject entries missing required fields, and `validate()` re-checks the same
//! invariants on entries that arrive through deserialization.
//!
//! Structured fields (`context`, `params`, `result`, `payload`) are plain
//! `serde_json::Value` trees; the ledger canonicalises them before hashing.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    agent::AgentId,
    error::{WardenError, WardenResult},
};

/// Current wall-clock time truncated to whole milliseconds.
///
/// Entries and records serialise timestamps as epoch milliseconds, so the
/// in-memory value is truncated up front to keep it equal to its own
/// round-tripped form.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Deserialize a field that is optional but, when present, must be kept
/// verbatim, including an explicit JSON `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn require_non_empty(field: &str, value: &str) -> WardenResult<()> {
    if value.trim().is_empty() {
        return Err(WardenError::InvalidEntry {
            reason: format!("'{field}' must not be empty"),
        });
    }
    Ok(())
}

// ── Enumerations ─────────────────────────────────────────────────────────────

/// Outcome of a single intercepted tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolCallStatus {
    Success,
    Error,
    /// Denied at the approval gate; the tool never ran.
    Blocked,
}

impl fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToolCallStatus::Success => "SUCCESS",
            ToolCallStatus::Error => "ERROR",
            ToolCallStatus::Blocked => "BLOCKED",
        })
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        })
    }
}

// ── DecisionEntry ────────────────────────────────────────────────────────────

/// A decision the agent took, with the situation it saw and how sure it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    /// What the agent was looking at when it decided.
    pub context: Value,
    /// The chosen action or output.
    pub decision: Value,
    /// Conventionally in `[0.0, 1.0]`; must be finite.
    pub confidence: f64,
    /// Local reference id for de-duplication. Not the ledger chain hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl DecisionEntry {
    /// Build a decision entry stamped with the current time and a fresh
    /// reference id.
    pub fn new(
        agent_id: AgentId,
        context: Value,
        decision: Value,
        confidence: f64,
    ) -> WardenResult<Self> {
        let entry = Self {
            timestamp: now_millis(),
            agent_id,
            context,
            decision,
            confidence,
            hash: Some(uuid::Uuid::new_v4().simple().to_string()),
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> WardenResult<()> {
        require_non_empty("agentId", self.agent_id.as_str())?;
        if !self.confidence.is_finite() {
            return Err(WardenError::InvalidEntry {
                reason: format!("confidence must be a finite number, got {}", self.confidence),
            });
        }
        Ok(())
    }
}

// ── ToolCallEntry ────────────────────────────────────────────────────────────

/// One intercepted tool invocation.
///
/// `result` is present only on `SUCCESS`, `error` only on `ERROR` and
/// `BLOCKED`. A blocked call always has zero duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub tool: String,
    pub params: Value,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock milliseconds spent in the executor.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub status: ToolCallStatus,
}

impl ToolCallEntry {
    pub fn succeeded(
        agent_id: AgentId,
        tool: impl Into<String>,
        params: Value,
        result: Value,
        duration_ms: u64,
    ) -> WardenResult<Self> {
        Self::build(agent_id, tool.into(), params, Some(result), None, duration_ms, ToolCallStatus::Success)
    }

    pub fn failed(
        agent_id: AgentId,
        tool: impl Into<String>,
        params: Value,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> WardenResult<Self> {
        Self::build(
            agent_id,
            tool.into(),
            params,
            None,
            Some(error.into()),
            duration_ms,
            ToolCallStatus::Error,
        )
    }

    /// A call that was denied before execution.
    pub fn blocked(
        agent_id: AgentId,
        tool: impl Into<String>,
        params: Value,
        reason: impl Into<String>,
    ) -> WardenResult<Self> {
        Self::build(
            agent_id,
            tool.into(),
            params,
            None,
            Some(reason.into()),
            0,
            ToolCallStatus::Blocked,
        )
    }

    fn build(
        agent_id: AgentId,
        tool: String,
        params: Value,
        result: Option<Value>,
        error: Option<String>,
        duration_ms: u64,
        status: ToolCallStatus,
    ) -> WardenResult<Self> {
        let entry = Self {
            timestamp: now_millis(),
            agent_id,
            tool,
            params,
            result,
            error,
            duration_ms,
            status,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> WardenResult<()> {
        require_non_empty("agentId", self.agent_id.as_str())?;
        require_non_empty("tool", &self.tool)?;

        let violation = match self.status {
            ToolCallStatus::Success if self.result.is_none() => Some("SUCCESS requires a result"),
            ToolCallStatus::Success if self.error.is_some() => Some("SUCCESS must not carry an error"),
            ToolCallStatus::Error if self.error.is_none() => Some("ERROR requires an error message"),
            ToolCallStatus::Error if self.result.is_some() => Some("ERROR must not carry a result"),
            ToolCallStatus::Blocked if self.result.is_some() => Some("BLOCKED must not carry a result"),
            ToolCallStatus::Blocked if self.duration_ms != 0 => Some("BLOCKED must have zero duration"),
            _ => None,
        };

        match violation {
            Some(reason) => Err(WardenError::InvalidEntry {
                reason: format!("tool call '{}': {}", self.tool, reason),
            }),
            None => Ok(()),
        }
    }
}

// ── CommunicationEntry ───────────────────────────────────────────────────────

/// A message exchanged with another agent or party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    /// Free-form category (e.g. "handoff", "status_report").
    pub comm_type: String,
    pub payload: Value,
}

impl CommunicationEntry {
    pub fn new(agent_id: AgentId, comm_type: impl Into<String>, payload: Value) -> WardenResult<Self> {
        let entry = Self {
            timestamp: now_millis(),
            agent_id,
            comm_type: comm_type.into(),
            payload,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> WardenResult<()> {
        require_non_empty("agentId", self.agent_id.as_str())?;
        require_non_empty("commType", &self.comm_type)
    }
}

// ── AlertEntry ───────────────────────────────────────────────────────────────

/// An anomaly surfaced by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub severity: Severity,
    pub reason: String,
    /// Evidence that triggered the alert.
    pub context: Value,
}

impl AlertEntry {
    /// Returns `WardenError::InvalidEntry` if `agent_id` or `reason` is empty.
    pub fn new(
        agent_id: AgentId,
        severity: Severity,
        reason: impl Into<String>,
        context: Value,
    ) -> WardenResult<Self> {
        let alert = Self {
            timestamp: now_millis(),
            agent_id,
            severity,
            reason: reason.into(),
            context,
        };
        alert.validate()?;
        Ok(alert)
    }

    pub fn validate(&self) -> WardenResult<()> {
        require_non_empty("agentId", self.agent_id.as_str())?;
        require_non_empty("reason", &self.reason)
    }
}

// ── Entry envelope ───────────────────────────────────────────────────────────

/// Any entry the ledger can wrap, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entry {
    #[serde(rename = "DECISION")]
    Decision(DecisionEntry),
    #[serde(rename = "TOOL_CALL")]
    ToolCall(ToolCallEntry),
    #[serde(rename = "COMM")]
    Communication(CommunicationEntry),
    #[serde(rename = "ALERT")]
    Alert(AlertEntry),
}

impl Entry {
    /// The type name used as the ledger record's `action`.
    pub fn action(&self) -> &'static str {
        match self {
            Entry::Decision(_) => "DECISION",
            Entry::ToolCall(_) => "TOOL_CALL",
            Entry::Communication(_) => "COMM",
            Entry::Alert(_) => "ALERT",
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        match self {
            Entry::Decision(e) => &e.agent_id,
            Entry::ToolCall(e) => &e.agent_id,
            Entry::Communication(e) => &e.agent_id,
            Entry::Alert(e) => &e.agent_id,
        }
    }

    pub fn validate(&self) -> WardenResult<()> {
        match self {
            Entry::Decision(e) => e.validate(),
            Entry::ToolCall(e) => e.validate(),
            Entry::Communication(e) => e.validate(),
            Entry::Alert(e) => e.validate(),
        }
    }

    /// Serialize into the structured value stored in a ledger record.
    pub fn to_value(&self) -> WardenResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<DecisionEntry> for Entry {
    fn from(e: DecisionEntry) -> Self {
        Entry::Decision(e)
    }
}

impl From<ToolCallEntry> for Entry {
    fn from(e: ToolCallEntry) -> Self {
        Entry::ToolCall(e)
    }
}

impl From<CommunicationEntry> for Entry {
    fn from(e: CommunicationEntry) -> Self {
        Entry::Communication(e)
    }
}

impl From<AlertEntry> for Entry {
    fn from(e: AlertEntry) -> Self {
        Entry::Alert(e)
    }
}
