//! Risk assessment and approval request types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentId;

/// The outcome of classifying a tool call before execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risky: bool,
    /// Every trigger that fired, e.g. "risky tool 'file_delete'" or
    /// "params mention 'drop'". Empty when `risky` is false.
    pub reasons: Vec<String>,
}

impl RiskAssessment {
    pub fn summary(&self) -> String {
        self.reasons.join("; ")
    }
}

/// A pending risky invocation handed to the approval collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub agent_id: AgentId,
    pub tool: String,
    pub params: Value,
    /// Why the call was classified risky.
    pub reasons: Vec<String>,
}
