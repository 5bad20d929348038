//! Rule-based detector implementation.
//!
//! Evaluation order for tool calls, first match wins:
//!
//! 1. risky tool that did not succeed  -> high
//! 2. risky tool that succeeded        -> medium
//! 3. non-risky call at/over the slow threshold -> low
//! 4. registered `AnomalyRule`s, in registration order
//!
//! Decisions: below `critical_confidence` -> critical, below
//! `low_confidence` -> medium, otherwise the registered rules.

use std::path::Path;

use serde_json::{json, Value};
use tracing::{debug, warn};

use warden_contracts::{
    agent::AgentId,
    entry::{AlertEntry, Severity, ToolCallEntry, ToolCallStatus},
    error::WardenResult,
};
use warden_core::traits::Detector;

use crate::rule::{AnomalyRule, DetectorConfig};

/// A `Detector` built from `DetectorConfig` thresholds plus optional extra
/// rules.
///
/// Holds only configuration; analysis never mutates it.
pub struct RuleDetector {
    config: DetectorConfig,
    rules: Vec<Box<dyn AnomalyRule>>,
}

impl Default for RuleDetector {
    fn default() -> Self {
        Self {
            config: DetectorConfig::default(),
            rules: Vec::new(),
        }
    }
}

impl RuleDetector {
    /// Build a detector from validated thresholds.
    pub fn new(config: DetectorConfig) -> WardenResult<Self> {
        config.validate()?;
        Ok(Self { config, rules: Vec::new() })
    }

    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        Self::new(DetectorConfig::from_toml_str(s)?)
    }

    pub fn from_file(path: &Path) -> WardenResult<Self> {
        Self::new(DetectorConfig::from_file(path)?)
    }

    /// Append a rule consulted after the built-ins.
    pub fn register_rule(&mut self, rule: Box<dyn AnomalyRule>) {
        debug!(rule_id = %rule.id(), "anomaly rule registered");
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: Box<dyn AnomalyRule>) -> Self {
        self.register_rule(rule);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn builtin_tool_call(&self, agent_id: &AgentId, entry: &ToolCallEntry) -> Option<AlertEntry> {
        let risky = self.config.is_risky_tool(&entry.tool);
        let evidence = json!({
            "tool": entry.tool,
            "status": entry.status,
            "duration": entry.duration_ms,
        });

        let (severity, reason) = match (risky, entry.status) {
            (true, ToolCallStatus::Success) => (Severity::Medium, "risky tool used".to_string()),
            (true, status) => (
                Severity::High,
                format!("risky tool '{}' finished with status {}", entry.tool, status),
            ),
            (false, _) if entry.duration_ms >= self.config.slow_threshold_ms => {
                (Severity::Low, "slow execution".to_string())
            }
            (false, _) => return None,
        };

        alert(agent_id, severity, reason, evidence)
    }
}

fn alert(agent_id: &AgentId, severity: Severity, reason: impl Into<String>, evidence: Value) -> Option<AlertEntry> {
    match AlertEntry::new(agent_id.clone(), severity, reason, evidence) {
        Ok(alert) => Some(alert),
        Err(e) => {
            warn!(agent_id = %agent_id, error = %e, "dropping malformed alert");
            None
        }
    }
}

impl Detector for RuleDetector {
    fn analyze_decision(&self, agent_id: &AgentId, confidence: f64, context: &Value) -> Option<AlertEntry> {
        let builtin = if confidence < self.config.critical_confidence {
            Some((Severity::Critical, "extremely low confidence"))
        } else if confidence < self.config.low_confidence {
            Some((Severity::Medium, "low confidence"))
        } else {
            None
        };

        if let Some((severity, reason)) = builtin {
            let evidence = json!({ "confidence": confidence, "context": context });
            return alert(agent_id, severity, reason, evidence);
        }

        self.rules.iter().find_map(|rule| {
            let alert = rule.on_decision(agent_id, confidence, context);
            if alert.is_some() {
                debug!(rule_id = %rule.id(), agent_id = %agent_id, "decision matched custom rule");
            }
            alert
        })
    }

    fn analyze_tool_call(&self, agent_id: &AgentId, entry: &ToolCallEntry) -> Option<AlertEntry> {
        if let Some(alert) = self.builtin_tool_call(agent_id, entry) {
            return Some(alert);
        }

        self.rules.iter().find_map(|rule| {
            let alert = rule.on_tool_call(agent_id, entry);
            if alert.is_some() {
                debug!(
                    rule_id = %rule.id(),
                    agent_id = %agent_id,
                    tool = %entry.tool,
                    "tool call matched custom rule"
                );
            }
            alert
        })
    }
}
