//! Simulated human reviewers for the approval gate.
//!
//! No real reviewer is contacted. `ScriptedApproval` answers from a fixed
//! script and reports itself unavailable once the script runs out, which the
//! governor treats as a denial.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tracing::info;

use warden_contracts::{
    approval::ApprovalRequest,
    error::{WardenError, WardenResult},
};
use warden_core::traits::ApprovalGate;

/// Every request the gate has seen, shared with the scenario.
pub type RequestLog = Arc<Mutex<Vec<ApprovalRequest>>>;

pub struct ScriptedApproval {
    answers: Mutex<VecDeque<bool>>,
    requests: RequestLog,
}

impl ScriptedApproval {
    /// Answer requests with `answers`, in order.
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            requests: Arc::default(),
        }
    }

    /// A reviewer who never answers.
    pub fn unavailable() -> Self {
        Self::new(Vec::new())
    }

    pub fn request_log(&self) -> RequestLog {
        Arc::clone(&self.requests)
    }
}

impl ApprovalGate for ScriptedApproval {
    fn request_approval(&self, request: &ApprovalRequest) -> WardenResult<bool> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let answer = self
            .answers
            .lock()
            .map_err(|e| WardenError::ApprovalUnavailable {
                reason: format!("reviewer script lock poisoned: {}", e),
            })?
            .pop_front();

        match answer {
            Some(approved) => {
                info!(
                    agent_id = %request.agent_id,
                    tool = %request.tool,
                    approved,
                    "reviewer answered"
                );
                Ok(approved)
            }
            None => Err(WardenError::ApprovalUnavailable {
                reason: "no reviewer responded".to_string(),
            }),
        }
    }
}
