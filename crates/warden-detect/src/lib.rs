//! # warden-detect
//!
//! Stateless anomaly detection for decisions and tool calls.
//!
//! ## Overview
//!
//! [`RuleDetector`] implements the [`Detector`](warden_core::traits::Detector)
//! trait. Its built-in rules flag low-confidence decisions, every use of a
//! risky tool, and slow non-risky calls. Thresholds come from a
//! [`DetectorConfig`] loaded from TOML; extra checks plug in as
//! [`AnomalyRule`]s without changing the call contract.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use warden_detect::RuleDetector;
//!
//! let detector = RuleDetector::from_toml_str("slow_threshold_ms = 500")?;
//! // Pass `detector` to `warden_core::Governor::new(...)`.
//! ```

pub mod engine;
pub mod rule;

pub use engine::RuleDetector;
pub use rule::{AnomalyRule, DetectorConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────
