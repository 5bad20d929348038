//! Events submitted to the external audit sink.
//!
//! Wire shape: `{agentId, type, level, payload}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    agent::AgentId,
    entry::{Severity, ToolCallStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Decision,
    ToolCall,
    /// A committed ledger record.
    Ledger,
    Comm,
    Alert,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventType::Decision => "DECISION",
            EventType::ToolCall => "TOOL_CALL",
            EventType::Ledger => "LEDGER",
            EventType::Comm => "COMM",
            EventType::Alert => "ALERT",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl EventLevel {
    /// Level for a tool call outcome.
    pub fn for_status(status: ToolCallStatus) -> Self {
        match status {
            ToolCallStatus::Success => EventLevel::Success,
            ToolCallStatus::Error => EventLevel::Error,
            ToolCallStatus::Blocked => EventLevel::Warning,
        }
    }

    /// Level for an alert: low and medium warn, high and critical are errors.
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Low | Severity::Medium => EventLevel::Warning,
            Severity::High | Severity::Critical => EventLevel::Error,
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventLevel::Info => "info",
            EventLevel::Warning => "warning",
            EventLevel::Error => "error",
            EventLevel::Success => "success",
        })
    }
}

/// One structured event for the audit sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkEvent {
    pub agent_id: AgentId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub level: EventLevel,
    pub payload: Value,
}

impl SinkEvent {
    pub fn new(agent_id: AgentId, event_type: EventType, level: EventLevel, payload: Value) -> Self {
        Self { agent_id, event_type, level, payload }
    }
}
