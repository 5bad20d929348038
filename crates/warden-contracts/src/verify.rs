//! Chain verification report types.
//!
//! A verifier walks a chain from index 1 and reports every rule that fails.
//! Everything from the first failing record onward is untrusted.

use serde::{Deserialize, Serialize};

use crate::{
    error::{WardenError, WardenResult},
    record::HashKind,
};

/// Rule ids for failures that stop verification before any record is
/// examined.
pub const STRUCTURAL_RULES: &[&str] = &[RULE_JSON_PARSE, RULE_JSON_SCHEMA, RULE_EXPORT_DECODE];

pub const RULE_JSON_PARSE: &str = "json-parse";
pub const RULE_JSON_SCHEMA: &str = "json-schema";
pub const RULE_EXPORT_DECODE: &str = "export-decode";
pub const RULE_HEAD_HASH: &str = "head-hash";
pub const RULE_EXPORT_HASH_KIND: &str = "export-hash-kind";

/// The result of verifying one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    /// True only if every rule passed for every record.
    pub passed: bool,
    /// Number of leading records that verified before the first failure.
    pub trusted_records: u64,
    /// Index of the first record that must be treated as untrusted.
    pub first_untrusted_index: Option<u64>,
    /// The weakest hash kind seen in the chain.
    pub hash_kind: Option<HashKind>,
    /// True when any record relies on the non-cryptographic fallback.
    pub reduced_integrity: bool,
    /// All failures found, in chain order. Empty on pass.
    pub failures: Vec<ChainFailure>,
}

impl ChainReport {
    /// Turn a failed report into an error naming the first failure.
    ///
    /// A document that never got as far as the chain rules yields
    /// `SchemaValidation`; anything else is an `IntegrityViolation`.
    pub fn ensure_passed(&self) -> WardenResult<()> {
        if self.passed {
            return Ok(());
        }
        match self.failures.first() {
            Some(f) if STRUCTURAL_RULES.contains(&f.rule_id.as_str()) => {
                Err(WardenError::SchemaValidation {
                    reason: format!("{}: {}", f.rule_id, f.message),
                })
            }
            Some(f) => Err(WardenError::IntegrityViolation {
                index: f.index,
                reason: format!("{}: {}", f.rule_id, f.message),
            }),
            None => Err(WardenError::IntegrityViolation {
                index: self.first_untrusted_index.unwrap_or(0),
                reason: "chain failed verification".to_string(),
            }),
        }
    }
}

/// A single rule failure within a `ChainReport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainFailure {
    /// Index of the offending record, or 0 for document-level failures.
    pub index: u64,
    pub rule_id: String,
    pub message: String,
}
