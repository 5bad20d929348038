//! # warden-ledger
//!
//! Append-only, per-agent, hash-chained audit ledger.
//!
//! ## Overview
//!
//! Every entry the governor commits is wrapped in a `LedgerRecord` that
//! links to the previous record via its hash. Tampering with any record,
//! even a single byte, breaks the chain and is detected by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_ledger::AgentLedger;
//! use warden_core::traits::Ledger;
//!
//! let ledger = AgentLedger::new(AgentId::new("A1"));
//! ledger.append("DECISION", entry_json)?;
//!
//! assert!(ledger.verify_integrity());
//! let export = ledger.export()?;
//! ```

pub mod chain;
pub mod memory;

pub use chain::{find_break, verify_chain, BreakKind, ChainBreak};
pub use memory::AgentLedger;

// ── Tests ─────────────────────────────────────────────────────────────────────
