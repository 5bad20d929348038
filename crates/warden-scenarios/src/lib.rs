//! # warden-scenarios
//!
//! Reference scenarios for the Warden audit and governance core.
//!
//! Each scenario wires real components (ledger, detector, governor,
//! verifier) to simulated tools and reviewers:
//!
//! 1. **Decision Screening**: decisions with falling confidence raise medium
//!    and critical alerts.
//! 2. **Blocked Mutation**: a risky DELETE is denied at the approval gate and
//!    recorded as BLOCKED without ever running.
//! 3. **Tool Failures**: successful, failing, slow, and approved-but-failing
//!    calls are each recorded exactly once.
//! 4. **Agent Communications**: two agents keep independent chains; a forged
//!    export is rejected by the verifier.
//!
//! All tools and reviewers are fictional. No external systems are contacted.

pub mod approvals;
pub mod config;
pub mod mock_tools;
pub mod scenarios;

pub use config::WardenConfig;
pub use scenarios::{run_all, AgentChain, ScenarioContext, ScenarioRun};
