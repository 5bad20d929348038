//! Error types shared across the Warden crates.
//!
//! All fallible operations return `WardenResult<T>`. The tool-call path in
//! warden-core wraps these in its own generic error so the executor's
//! original failure can be handed back untouched.

use thiserror::Error;

/// The unified error type for the Warden audit core.
#[derive(Debug, Error)]
pub enum WardenError {
    /// An entry was missing a required field or violated a field invariant.
    #[error("invalid entry: {reason}")]
    InvalidEntry { reason: String },

    /// The ledger could not commit a record.
    ///
    /// A call whose record cannot be committed fails; the chain is the
    /// source of truth.
    #[error("ledger append failed: {reason}")]
    LedgerAppendFailed { reason: String },

    /// The approval collaborator could not produce a verdict.
    ///
    /// The governor treats this exactly like a denial.
    #[error("approval unavailable: {reason}")]
    ApprovalUnavailable { reason: String },

    /// The audit sink rejected or could not accept an event.
    #[error("audit sink unavailable: {reason}")]
    SinkUnavailable { reason: String },

    /// A configuration value is missing, malformed, or out of range.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// An exported document could not be parsed or failed JSON Schema
    /// validation.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },

    /// A record failed hash recomputation or linkage checks.
    #[error("integrity violation at index {index}: {reason}")]
    IntegrityViolation { index: u64, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the Warden crates.
pub type WardenResult<T> = Result<T, WardenError>;
