//! # warden-core
//!
//! The governance pipeline for Warden-audited agents.
//!
//! This crate provides:
//! - The four collaborator traits (`Ledger`, `Detector`, `ApprovalGate`, `AuditSink`)
//! - `RiskPolicy`, the pre-execution risk classifier
//! - Sink implementations (`MemorySink`, `TracingSink`, `FanoutSink`, `QueuedSink`)
//! - The `Governor` that wires them together in the correct order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_core::{Governor, traits::{Ledger, Detector, ApprovalGate, AuditSink}};
//!
//! let governor = Governor::new(ledger, detector, approvals, sink);
//! let rows = governor.intercept_tool_call("db_query", params, |p| run_query(p))?;
//! ```

pub mod governor;
pub mod risk;
pub mod sink;
pub mod traits;

pub use governor::{DecisionLogged, Governor, GovernorOptions, ToolCallError};
pub use risk::RiskPolicy;
