//! Combined `warden.toml` configuration.
//!
//! One document configures every component a scenario wires up:
//!
//! ```toml
//! [risk]
//! risky_tools = ["database_modify", "shell_exec"]
//!
//! [detector]
//! slow_threshold_ms = 500
//!
//! [governor]
//! chain_alerts = true
//!
//! [ledger]
//! hash_kind = "checksum32"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use warden_contracts::{
    error::{WardenError, WardenResult},
    record::HashKind,
};
use warden_core::{GovernorOptions, RiskPolicy};
use warden_detect::DetectorConfig;

/// The settings shipped with the scenarios crate.
pub const DEFAULT_CONFIG: &str = include_str!("../config/warden.toml");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Digest for new ledgers. `None` picks the strongest this build offers.
    pub hash_kind: Option<HashKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub risk: RiskPolicy,
    pub detector: DetectorConfig,
    pub governor: GovernorOptions,
    pub ledger: LedgerSettings,
}

impl WardenConfig {
    /// Parse `s` as TOML and validate the detector thresholds.
    ///
    /// Unless `[detector]` lists its own `risky_tools`, the detector reports
    /// on the same tools `[risk]` sends to the approval gate.
    ///
    /// Returns `WardenError::ConfigError` if the TOML is malformed or any
    /// section is invalid.
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        let parse_error = |e: toml::de::Error| WardenError::ConfigError {
            reason: format!("failed to parse warden config TOML: {}", e),
        };
        let raw: toml::Table = toml::from_str(s).map_err(parse_error)?;
        let mut config: Self = toml::from_str(s).map_err(parse_error)?;

        let detector_lists_tools = raw
            .get("detector")
            .and_then(|section| section.get("risky_tools"))
            .is_some();
        if !detector_lists_tools {
            config.detector.risky_tools = config.risk.risky_tools.clone();
        }

        config.detector.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_config_parses() {
        let config = WardenConfig::from_toml_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.risk, RiskPolicy::default());
        assert_eq!(config.detector, DetectorConfig::default());
        assert!(!config.governor.chain_alerts);
        assert_eq!(config.ledger.hash_kind, Some(HashKind::Sha256));
    }

    #[test]
    fn test_sections_are_optional() {
        let config = WardenConfig::from_toml_str("[governor]\nchain_alerts = true").unwrap();
        assert!(config.governor.chain_alerts);
        assert_eq!(config.detector, DetectorConfig::default());
        assert_eq!(config.ledger.hash_kind, None);
    }

    #[test]
    fn test_detector_follows_risk_tools_by_default() {
        let config = WardenConfig::from_toml_str("[risk]\nrisky_tools = [\"wire_funds\"]").unwrap();
        assert!(config.detector.is_risky_tool("wire_funds"));
        assert!(!config.detector.is_risky_tool("database_modify"));
    }

    #[test]
    fn test_detector_tools_can_be_set_separately() {
        let config = WardenConfig::from_toml_str(
            "[risk]\nrisky_tools = [\"wire_funds\"]\n[detector]\nrisky_tools = [\"shell_exec\"]",
        )
        .unwrap();
        assert!(config.risk.is_risky_tool("wire_funds"));
        assert!(!config.detector.is_risky_tool("wire_funds"));
        assert!(config.detector.is_risky_tool("shell_exec"));
    }

    #[test]
    fn test_invalid_detector_section_rejected() {
        let err = WardenConfig::from_toml_str("[detector]\ncritical_confidence = 0.9").unwrap_err();
        assert!(matches!(err, WardenError::ConfigError { .. }));
    }

    #[test]
    fn test_unknown_hash_kind_rejected() {
        assert!(WardenConfig::from_toml_str("[ledger]\nhash_kind = \"md5\"").is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = WardenConfig::from_file(Path::new("/nonexistent/warden.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
