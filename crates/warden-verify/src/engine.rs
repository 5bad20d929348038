//! External chain verifier.
//!
//! `ChainVerifier` re-checks a chain it did not build. It works on records
//! already in memory or on an exported JSON document, in which case
//! verification runs in two phases:
//!
//! 1. **Structural**: the document is validated against the export JSON
//!    Schema using the `jsonschema` crate, then decoded into a
//!    `LedgerExport`.
//! 2. **Chain**: every record is checked against the chain rules and the
//!    export's `hashKind`, and the export's `headHash` is compared with the
//!    last record.
//!
//! All failures are collected so an auditor sees the full set in one pass.
//! Document-level failures carry index 0.

use serde_json::{json, Value};
use tracing::{debug, warn};

use warden_contracts::{
    agent::AgentId,
    record::{HashKind, LedgerExport, LedgerRecord, GENESIS_HASH},
    verify::{
        ChainFailure, ChainReport, RULE_EXPORT_DECODE, RULE_EXPORT_HASH_KIND, RULE_HEAD_HASH,
        RULE_JSON_PARSE, RULE_JSON_SCHEMA,
    },
};
use warden_ledger::chain::{check_record, Expectation};

/// JSON Schema for a serialized `LedgerExport`.
pub fn export_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Warden ledger export",
        "type": "object",
        "required": ["agentId", "hashKind", "records", "exportedAt"],
        "properties": {
            "agentId": { "type": "string", "minLength": 1 },
            "hashKind": { "enum": ["sha256", "checksum32"] },
            "headHash": { "type": ["string", "null"], "pattern": "^[0-9a-f]+$" },
            "exportedAt": { "type": "integer" },
            "records": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": [
                        "index", "timestamp", "agentId", "action",
                        "data", "prevHash", "hash", "hashKind"
                    ],
                    "properties": {
                        "index": { "type": "integer", "minimum": 1 },
                        "timestamp": { "type": "integer" },
                        "agentId": { "type": "string", "minLength": 1 },
                        "action": { "type": "string", "minLength": 1 },
                        "prevHash": { "type": "string", "pattern": "^[0-9a-f]+$" },
                        "hash": { "type": "string", "pattern": "^[0-9a-f]+$" },
                        "hashKind": { "enum": ["sha256", "checksum32"] }
                    }
                }
            }
        }
    })
}

/// Verifies hash chains produced by any Warden ledger.
pub struct ChainVerifier {
    schema: Value,
}

impl ChainVerifier {
    pub fn new() -> Self {
        Self { schema: export_schema() }
    }

    /// Check `records` as a complete chain starting at index 1.
    pub fn verify_records(&self, records: &[LedgerRecord]) -> ChainReport {
        let agent_id = records.first().map(|r| &r.agent_id);
        self.check_chain(records, agent_id)
    }

    /// Check an export: its records must all belong to the exporting agent
    /// and carry its declared `hashKind`, and its `headHash` must name the
    /// last record.
    pub fn verify_export(&self, export: &LedgerExport) -> ChainReport {
        let mut report = self.check_chain(&export.records, Some(&export.agent_id));

        for (i, record) in export.records.iter().enumerate() {
            if record.hash_kind == export.hash_kind {
                continue;
            }
            let position = i as u64 + 1;
            let message = format!(
                "record hashKind {} differs from export hashKind {}",
                record.hash_kind.as_str(),
                export.hash_kind.as_str()
            );
            warn!(agent_id = %export.agent_id, index = position, %message, "export hash kind mismatch");
            report.failures.push(ChainFailure {
                index: position,
                rule_id: RULE_EXPORT_HASH_KIND.to_string(),
                message,
            });
            if !report.first_untrusted_index.is_some_and(|idx| idx <= position) {
                report.first_untrusted_index = Some(position);
                report.trusted_records = position - 1;
            }
            report.passed = false;
        }

        let actual_head = export.records.last().map(|r| r.hash.as_str());
        if export.head_hash.as_deref() != actual_head {
            let message = format!(
                "headHash {} does not match last record hash {}",
                export.head_hash.as_deref().unwrap_or("<none>"),
                actual_head.unwrap_or("<none>")
            );
            warn!(agent_id = %export.agent_id, %message, "export head mismatch");
            report.failures.push(ChainFailure {
                index: 0,
                rule_id: RULE_HEAD_HASH.to_string(),
                message,
            });
            report.passed = false;
        }

        report
    }

    /// Validate and verify a JSON export document.
    pub fn verify_document(&self, document: &Value) -> ChainReport {
        let mut structural = Vec::new();
        match jsonschema::validator_for(&self.schema) {
            Ok(validator) => {
                for error in validator.iter_errors(document) {
                    let message = format!("JSON Schema violation at {}: {}", error.instance_path, error);
                    warn!(%message, "structural validation failure");
                    structural.push(document_failure(RULE_JSON_SCHEMA, message));
                }
            }
            Err(e) => {
                let message = format!("invalid JSON Schema document: {e}");
                warn!(%message, "schema compilation failure");
                structural.push(document_failure(RULE_JSON_SCHEMA, message));
            }
        }
        if !structural.is_empty() {
            return untrusted(structural);
        }

        match serde_json::from_value::<LedgerExport>(document.clone()) {
            Ok(export) => self.verify_export(&export),
            Err(e) => {
                warn!(error = %e, "export document could not be decoded");
                untrusted(vec![document_failure(RULE_EXPORT_DECODE, format!("export could not be decoded: {e}"))])
            }
        }
    }

    /// Parse `text` as JSON, then `verify_document`.
    pub fn verify_str(&self, text: &str) -> ChainReport {
        match serde_json::from_str::<Value>(text) {
            Ok(document) => self.verify_document(&document),
            Err(e) => untrusted(vec![document_failure(RULE_JSON_PARSE, format!("not valid JSON: {e}"))]),
        }
    }

    fn check_chain(&self, records: &[LedgerRecord], agent_id: Option<&AgentId>) -> ChainReport {
        let mut failures = Vec::new();
        let mut first_untrusted_index = None;
        let mut prev_hash = GENESIS_HASH;
        let mut not_before = None;
        let mut weakest: Option<HashKind> = None;

        for (i, record) in records.iter().enumerate() {
            let position = i as u64 + 1;
            let expected = Expectation { position, prev_hash, agent_id, not_before };

            let breaks = check_record(record, &expected);
            if !breaks.is_empty() && first_untrusted_index.is_none() {
                first_untrusted_index = Some(position);
            }
            for brk in breaks {
                warn!(
                    index = brk.position,
                    rule_id = brk.kind.rule_id(),
                    message = %brk.message,
                    "chain rule failed"
                );
                failures.push(ChainFailure {
                    index: brk.position,
                    rule_id: brk.kind.rule_id().to_string(),
                    message: brk.message,
                });
            }

            weakest = match weakest {
                Some(kind) if !kind.is_cryptographic() => Some(kind),
                _ => Some(record.hash_kind),
            };

            // Keep walking from what the chain actually says, so each later
            // record is judged on its own linkage.
            prev_hash = record.hash.as_str();
            not_before = Some(record.timestamp);
        }

        let trusted_records = first_untrusted_index.map_or(records.len() as u64, |idx| idx - 1);
        let reduced_integrity = weakest.is_some_and(|kind| !kind.is_cryptographic());

        debug!(
            records = records.len(),
            trusted_records,
            failures = failures.len(),
            reduced_integrity,
            "chain verified"
        );

        ChainReport {
            passed: failures.is_empty(),
            trusted_records,
            first_untrusted_index,
            hash_kind: weakest,
            reduced_integrity,
            failures,
        }
    }
}

impl Default for ChainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn document_failure(rule_id: &str, message: String) -> ChainFailure {
    ChainFailure { index: 0, rule_id: rule_id.to_string(), message }
}

/// A report for a document whose records could not be examined at all.
fn untrusted(failures: Vec<ChainFailure>) -> ChainReport {
    ChainReport {
        passed: false,
        trusted_records: 0,
        first_untrusted_index: Some(1),
        hash_kind: None,
        reduced_integrity: false,
        failures,
    }
}
