//! Detector thresholds and the pluggable rule interface.
//!
//! `DetectorConfig` is deserialized from TOML. Every field has a default, so
//! an empty document yields the stock thresholds:
//!
//! ```toml
//! low_confidence = 0.5
//! critical_confidence = 0.2
//! slow_threshold_ms = 2000
//! risky_tools = ["database_modify", "file_delete", "shell_exec"]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use warden_contracts::{
    agent::AgentId,
    entry::{AlertEntry, ToolCallEntry},
    error::{WardenError, WardenResult},
};
use warden_core::risk::DEFAULT_RISKY_TOOLS;

/// Thresholds for the built-in rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Confidence strictly below this raises a medium alert.
    pub low_confidence: f64,

    /// Confidence strictly below this raises a critical alert instead.
    pub critical_confidence: f64,

    /// Non-risky calls at or above this duration raise a low alert.
    pub slow_threshold_ms: u64,

    /// Tools whose every use is reported.
    pub risky_tools: BTreeSet<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            low_confidence: 0.5,
            critical_confidence: 0.2,
            slow_threshold_ms: 2000,
            risky_tools: DEFAULT_RISKY_TOOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DetectorConfig {
    /// Parse `s` as TOML and validate the thresholds.
    ///
    /// Returns `WardenError::ConfigError` if the TOML is malformed or the
    /// confidence bounds are out of order.
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to parse detector TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to read detector config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Require `0 <= critical_confidence <= low_confidence <= 1`.
    pub fn validate(&self) -> WardenResult<()> {
        let (critical, low) = (self.critical_confidence, self.low_confidence);
        let ordered = critical.is_finite()
            && low.is_finite()
            && (0.0..=1.0).contains(&critical)
            && (0.0..=1.0).contains(&low)
            && critical <= low;

        if !ordered {
            return Err(WardenError::ConfigError {
                reason: format!(
                    "detector thresholds must satisfy 0 <= critical_confidence ({}) <= low_confidence ({}) <= 1",
                    critical, low
                ),
            });
        }
        Ok(())
    }

    pub fn is_risky_tool(&self, tool: &str) -> bool {
        self.risky_tools.contains(tool)
    }
}

/// An extra anomaly check registered on a `RuleDetector`.
///
/// Rules only run when no built-in rule matched. Both hooks default to
/// "nothing anomalous", so a rule implements only what it inspects.
pub trait AnomalyRule: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &str;

    fn on_decision(&self, _agent_id: &AgentId, _confidence: f64, _context: &Value) -> Option<AlertEntry> {
        None
    }

    fn on_tool_call(&self, _agent_id: &AgentId, _entry: &ToolCallEntry) -> Option<AlertEntry> {
        None
    }
}
