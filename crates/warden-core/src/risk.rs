//! Pre-execution risk classification for tool calls.
//!
//! A call is risky when its tool is on the static risky list, or when any key
//! or string value in its params mentions a mutating keyword. The scan is
//! over-broad: "overwrite" trips "write".

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use warden_contracts::{
    approval::RiskAssessment,
    error::{WardenError, WardenResult},
};

/// Tools that mutate data or touch secrets.
pub const DEFAULT_RISKY_TOOLS: &[&str] = &[
    "database_modify",
    "database_delete",
    "file_write",
    "file_delete",
    "shell_exec",
    "secrets_read",
    "payment_transfer",
];

pub const DEFAULT_MUTATING_KEYWORDS: &[&str] = &["delete", "drop", "truncate", "write"];

/// Static risky-tool list plus the params keyword scan.
///
/// Every field has a default, so a TOML document only needs to list what it
/// overrides:
///
/// ```toml
/// risky_tools = ["database_modify", "wire_funds"]
/// mutating_keywords = ["delete", "drop", "truncate", "write", "revoke"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub risky_tools: BTreeSet<String>,
    /// Matched case-insensitively as substrings.
    pub mutating_keywords: Vec<String>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            risky_tools: DEFAULT_RISKY_TOOLS.iter().map(|s| s.to_string()).collect(),
            mutating_keywords: DEFAULT_MUTATING_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RiskPolicy {
    /// Parse `s` as TOML.
    ///
    /// Returns `WardenError::ConfigError` if the document is malformed.
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        toml::from_str(s).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to parse risk policy TOML: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to read risk policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn is_risky_tool(&self, tool: &str) -> bool {
        self.risky_tools.contains(tool)
    }

    /// Classify one pending tool call.
    pub fn assess(&self, tool: &str, params: &Value) -> RiskAssessment {
        let mut reasons = Vec::new();

        if self.is_risky_tool(tool) {
            reasons.push(format!("risky tool '{}'", tool));
        }

        let mut hits = BTreeSet::new();
        self.scan(params, &mut hits);
        for keyword in hits {
            reasons.push(format!("params mention '{}'", keyword));
        }

        debug!(tool = %tool, triggers = reasons.len(), "risk assessed");

        RiskAssessment {
            risky: !reasons.is_empty(),
            reasons,
        }
    }

    fn scan<'k>(&'k self, value: &Value, hits: &mut BTreeSet<&'k str>) {
        match value {
            Value::String(s) => self.match_text(s, hits),
            Value::Array(items) => {
                for item in items {
                    self.scan(item, hits);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    self.match_text(key, hits);
                    self.scan(item, hits);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    fn match_text<'k>(&'k self, text: &str, hits: &mut BTreeSet<&'k str>) {
        let lowered = text.to_lowercase();
        for keyword in &self.mutating_keywords {
            if !keyword.is_empty() && lowered.contains(&keyword.to_lowercase()) {
                hits.insert(keyword.as_str());
            }
        }
    }
}
