//! Agent identity.
//!
//! Every entry, ledger record, and sink event is scoped to exactly one agent.
//! Warden does not prescribe what an agent is; it only needs a stable name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, human-readable identifier for an agent.
///
/// Appears in every entry and ledger record the agent produces.
/// Example: AgentId("billing-reconciler")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Construct an agent id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
