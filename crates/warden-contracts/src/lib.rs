//! # warden-contracts
//!
//! Shared types for the Warden agent audit core.
//!
//! All crates in the workspace import from here. Apart from constructors and
//! field validation, no logic lives in this crate: only the entry model,
//! ledger records, sink events, and the error type.

pub mod agent;
pub mod approval;
pub mod entry;
pub mod error;
pub mod event;
pub mod record;
pub mod verify;
