//! # warden-verify
//!
//! External integrity verification for Warden ledgers.
//!
//! This crate provides [`engine::ChainVerifier`], which re-checks a hash
//! chain without trusting the ledger that produced it. Exported JSON
//! documents are verified in two phases:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate.
//! 2. **Chain**: index contiguity, genesis and prev-hash linkage, hash
//!    recomputation, hash length, single agent, timestamp order, and
//!    head hash agreement.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use warden_verify::ChainVerifier;
//!
//! let report = ChainVerifier::new().verify_str(&std::fs::read_to_string(path)?);
//! if !report.passed {
//!     eprintln!("untrusted from index {:?}", report.first_untrusted_index);
//! }
//! ```

pub mod engine;

pub use engine::{export_schema, ChainVerifier};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use warden_contracts::{
        agent::AgentId,
        error::WardenError,
        record::{HashKind, LedgerExport},
    };
    use warden_core::traits::Ledger;
    use warden_ledger::{chain::recompute_hash, AgentLedger};

    use crate::ChainVerifier;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn export_of(n: u64) -> LedgerExport {
        let ledger = AgentLedger::new(AgentId::new("A1"));
        for i in 0..n {
            ledger.append("DECISION", json!({ "step": i })).unwrap();
        }
        ledger.export().unwrap()
    }

    fn document_of(n: u64) -> Value {
        serde_json::to_value(export_of(n)).unwrap()
    }

    fn rule_ids(report: &warden_contracts::verify::ChainReport) -> Vec<&str> {
        report.failures.iter().map(|f| f.rule_id.as_str()).collect()
    }

    // ── 1. clean chains ───────────────────────────────────────────────────────

    #[test]
    fn test_clean_export_passes() {
        let report = ChainVerifier::new().verify_document(&document_of(4));

        assert!(report.passed, "unexpected failures: {:?}", report.failures);
        assert_eq!(report.trusted_records, 4);
        assert_eq!(report.first_untrusted_index, None);
        assert_eq!(report.hash_kind, Some(HashKind::Sha256));
        assert!(!report.reduced_integrity);
        assert!(report.ensure_passed().is_ok());
    }

    #[test]
    fn test_empty_export_passes() {
        let report = ChainVerifier::new().verify_document(&document_of(0));
        assert!(report.passed);
        assert_eq!(report.trusted_records, 0);
        assert_eq!(report.hash_kind, None);
    }

    #[test]
    fn test_checksum_chain_flags_reduced_integrity() {
        let ledger = AgentLedger::with_hash_kind(AgentId::new("A1"), HashKind::Checksum32).unwrap();
        ledger.append("COMM", json!({ "commType": "ping" })).unwrap();

        let report = ChainVerifier::new().verify_export(&ledger.export().unwrap());
        assert!(report.passed);
        assert!(report.reduced_integrity);
        assert_eq!(report.hash_kind, Some(HashKind::Checksum32));
    }

    /// A checksum chain relabelled as sha256 is not accepted as sha256.
    #[test]
    fn test_relabelled_export_hash_kind_fails() {
        let ledger = AgentLedger::with_hash_kind(AgentId::new("A1"), HashKind::Checksum32).unwrap();
        ledger.append("COMM", json!({ "commType": "ping" })).unwrap();
        ledger.append("COMM", json!({ "commType": "pong" })).unwrap();

        let mut export = ledger.export().unwrap();
        export.hash_kind = HashKind::Sha256;
        let report = ChainVerifier::new().verify_export(&export);

        assert!(!report.passed);
        assert_eq!(rule_ids(&report), vec!["export-hash-kind", "export-hash-kind"]);
        assert_eq!(report.first_untrusted_index, Some(1));
        assert_eq!(report.trusted_records, 0);
        assert!(report.reduced_integrity);
    }

    // ── 2. tampering ──────────────────────────────────────────────────────────

    /// Editing data in the middle leaves the prefix trusted.
    #[test]
    fn test_tampered_data_marks_suffix_untrusted() {
        let mut doc = document_of(5);
        doc["records"][2]["data"]["step"] = json!(99);

        let report = ChainVerifier::new().verify_document(&doc);
        assert!(!report.passed);
        assert_eq!(report.first_untrusted_index, Some(3));
        assert_eq!(report.trusted_records, 2);
        assert_eq!(rule_ids(&report), vec!["hash-recompute"]);
    }

    /// Re-hashing the edited record moves the break to its successor.
    #[test]
    fn test_rehashed_tamper_breaks_linkage() {
        let mut export = export_of(3);
        export.records[0].data = json!({ "step": "rewritten" });
        export.records[0].hash = recompute_hash(&export.records[0]).unwrap().unwrap();

        let report = ChainVerifier::new().verify_export(&export);
        assert!(!report.passed);
        assert_eq!(report.first_untrusted_index, Some(2));
        assert!(rule_ids(&report).contains(&"prev-hash-linkage"));
        assert!(!rule_ids(&report).contains(&"head-hash"));
    }

    #[test]
    fn test_truncated_export_fails_head_hash() {
        let mut export = export_of(3);
        export.records.pop();

        let report = ChainVerifier::new().verify_export(&export);
        assert!(!report.passed);
        assert_eq!(report.trusted_records, 2);
        assert_eq!(rule_ids(&report), vec!["head-hash"]);
    }

    #[test]
    fn test_foreign_record_fails_single_agent() {
        let mut export = export_of(2);
        export.records[1].agent_id = AgentId::new("B7");
        export.records[1].hash = recompute_hash(&export.records[1]).unwrap().unwrap();
        export.head_hash = Some(export.records[1].hash.clone());

        let report = ChainVerifier::new().verify_export(&export);
        assert_eq!(rule_ids(&report), vec!["single-agent"]);
        assert_eq!(report.first_untrusted_index, Some(2));
    }

    #[test]
    fn test_every_failure_is_collected() {
        let mut export = export_of(4);
        export.records[1].data = json!("x");
        export.records[3].data = json!("y");

        let report = ChainVerifier::new().verify_export(&export);
        let indices: Vec<u64> = report.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![2, 4]);
        assert_eq!(report.first_untrusted_index, Some(2));
    }

    #[test]
    fn test_ensure_passed_names_first_failure() {
        let mut export = export_of(2);
        export.records[1].data = json!(null);

        let err = ChainVerifier::new().verify_export(&export).ensure_passed().unwrap_err();
        match err {
            WardenError::IntegrityViolation { index, reason } => {
                assert_eq!(index, 2);
                assert!(reason.starts_with("hash-recompute"));
            }
            other => panic!("expected IntegrityViolation, got {other:?}"),
        }
    }

    // ── 3. structural failures ────────────────────────────────────────────────

    #[test]
    fn test_schema_violation_reported() {
        let mut doc = document_of(2);
        doc["records"][0]["index"] = json!("one");

        let report = ChainVerifier::new().verify_document(&doc);
        assert!(!report.passed);
        assert_eq!(report.trusted_records, 0);
        assert!(rule_ids(&report).iter().all(|id| *id == "json-schema"));
        assert!(!report.failures.is_empty());
        assert!(matches!(report.ensure_passed(), Err(WardenError::SchemaValidation { .. })));
    }

    #[test]
    fn test_missing_records_field() {
        let report = ChainVerifier::new().verify_document(&json!({ "agentId": "A1" }));
        assert!(!report.passed);
        assert_eq!(report.failures[0].index, 0);
    }

    #[test]
    fn test_invalid_json_text() {
        let report = ChainVerifier::new().verify_str("{ not json");
        assert!(!report.passed);
        assert_eq!(rule_ids(&report), vec!["json-parse"]);
    }

    #[test]
    fn test_round_trip_through_text() {
        let text = serde_json::to_string_pretty(&export_of(3)).unwrap();
        assert!(ChainVerifier::new().verify_str(&text).passed);
    }
}
