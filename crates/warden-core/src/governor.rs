//! The Warden governor: the per-agent audit and governance coordinator.
//!
//! Every tool call runs through the same pipeline:
//!
//!   RiskCheck → [ApprovalGate] → Execute → Record → Detect
//!
//! The invariant is structural: the executor closure is only reachable after
//! the risk check passes or the approval gate returns an explicit approval.
//! Every call that reaches the gate or beyond produces exactly one ledger
//! append, whether it was blocked, failed, or succeeded.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Instant,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use warden_contracts::{
    agent::AgentId,
    approval::ApprovalRequest,
    entry::{AlertEntry, CommunicationEntry, DecisionEntry, Entry, ToolCallEntry},
    error::{WardenError, WardenResult},
    event::{EventLevel, EventType, SinkEvent},
    record::LedgerRecord,
};

use crate::{
    risk::RiskPolicy,
    sink::forward,
    traits::{ApprovalGate, AuditSink, Detector, Ledger},
};

/// Failure of an intercepted tool call.
///
/// `Failed` carries the executor's own error exactly as it was returned, so
/// callers see the same failure they would have seen without the governor.
#[derive(Debug, Error)]
pub enum ToolCallError<E> {
    /// Denied at the approval gate. The executor never ran.
    #[error("operation blocked: tool '{tool}': {reason}")]
    Blocked { tool: String, reason: String },

    /// The call was malformed and rejected before screening. Nothing was
    /// recorded.
    #[error("invalid tool call: {reason}")]
    Invalid { reason: String },

    /// The executor returned an error. The call was recorded as `ERROR`.
    #[error("{0}")]
    Failed(E),

    /// The call could not be committed to the ledger.
    #[error(transparent)]
    Ledger(#[from] WardenError),
}

impl<E> ToolCallError<E> {
    pub fn is_blocked(&self) -> bool {
        matches!(self, ToolCallError::Blocked { .. })
    }

    /// The executor's original error, if that is what this is.
    pub fn into_failure(self) -> Option<E> {
        match self {
            ToolCallError::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Behaviour switches for a governor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorOptions {
    /// Append every alert to the ledger as an `ALERT` record, directly after
    /// the record that triggered it. Off by default: alerts are an
    /// out-of-band stream and each tool call appends exactly one record.
    pub chain_alerts: bool,
}

/// What `log_decision` committed and raised.
#[derive(Debug, Clone)]
pub struct DecisionLogged {
    pub record: LedgerRecord,
    pub alert: Option<AlertEntry>,
}

/// The per-agent coordinator.
///
/// Construct one governor per agent session. It owns the trusted
/// collaborators and enforces the pipeline ordering on every call. A
/// governor may be shared behind an `Arc`; the ledger serializes appends.
pub struct Governor {
    ledger: Box<dyn Ledger>,
    detector: Box<dyn Detector>,
    approvals: Box<dyn ApprovalGate>,
    sink: Arc<dyn AuditSink>,
    risk: RiskPolicy,
    options: GovernorOptions,
}

impl Governor {
    /// Create a governor with the default risk policy and options.
    pub fn new(
        ledger: Box<dyn Ledger>,
        detector: Box<dyn Detector>,
        approvals: Box<dyn ApprovalGate>,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            ledger,
            detector,
            approvals,
            sink,
            risk: RiskPolicy::default(),
            options: GovernorOptions::default(),
        }
    }

    pub fn with_risk_policy(mut self, risk: RiskPolicy) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_options(mut self, options: GovernorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn agent_id(&self) -> &AgentId {
        self.ledger.agent_id()
    }

    pub fn risk_policy(&self) -> &RiskPolicy {
        &self.risk
    }

    /// Record a decision, then screen its confidence.
    ///
    /// Any alert is forwarded to the sink; it is only appended to the ledger
    /// when `chain_alerts` is set.
    pub fn log_decision(
        &self,
        context: Value,
        decision: Value,
        confidence: f64,
    ) -> WardenResult<DecisionLogged> {
        let entry = DecisionEntry::new(self.agent_id().clone(), context, decision, confidence)?;
        let record = self.commit(Entry::Decision(entry.clone()))?;
        self.emit(EventType::Decision, EventLevel::Info, record.data.clone());

        let alert = self
            .detector
            .analyze_decision(self.agent_id(), entry.confidence, &entry.context);
        if let Some(alert) = &alert {
            self.raise(alert);
        }

        Ok(DecisionLogged { record, alert })
    }

    /// Record a message exchanged with another party. No risk screening.
    pub fn record_communication(
        &self,
        comm_type: &str,
        payload: Value,
    ) -> WardenResult<LedgerRecord> {
        let entry = CommunicationEntry::new(self.agent_id().clone(), comm_type, payload)?;
        let record = self.commit(Entry::Communication(entry))?;
        self.emit(EventType::Comm, EventLevel::Info, record.data.clone());
        Ok(record)
    }

    /// Run `executor` under governance.
    ///
    /// # Pipeline
    ///
    /// 1. Classify the call with the risk policy
    /// 2. If risky, ask the approval gate:
    ///    - denied, erroring, or panicking → record `BLOCKED`, run detection,
    ///      return `ToolCallError::Blocked` (the executor is never called)
    ///    - approved → continue
    /// 3. Call `executor(&params)`, timing it
    /// 4. Append exactly one `TOOL_CALL` record (`SUCCESS` or `ERROR`)
    /// 5. Run detection and forward any alert
    /// 6. Return the result, or the executor's original error unchanged
    ///
    /// A panicking executor is recorded as `ERROR` and the panic is resumed
    /// after steps 4 and 5.
    ///
    /// # Errors
    ///
    /// `Invalid` for an empty tool name, `Blocked` for denied calls, `Failed`
    /// for executor errors, and `Ledger` when the call cannot be committed. On the error path the executor's
    /// failure takes precedence over a commit failure, which is only logged.
    pub fn intercept_tool_call<F, E>(
        &self,
        tool: &str,
        params: Value,
        executor: F,
    ) -> Result<Value, ToolCallError<E>>
    where
        F: FnOnce(&Value) -> Result<Value, E>,
        E: fmt::Display,
    {
        let agent_id = self.agent_id().clone();

        if tool.trim().is_empty() {
            return Err(ToolCallError::Invalid {
                reason: "'tool' must not be empty".to_string(),
            });
        }

        // ── Risk check ───────────────────────────────────────────────────────
        let assessment = self.risk.assess(tool, &params);

        // ── Approval gate ────────────────────────────────────────────────────
        //
        // Only an explicit Ok(true) lets a risky call through.
        if assessment.risky {
            let request = ApprovalRequest {
                agent_id: agent_id.clone(),
                tool: tool.to_string(),
                params: params.clone(),
                reasons: assessment.reasons.clone(),
            };

            if let Err(reason) = self.seek_approval(&request) {
                warn!(
                    agent_id = %agent_id,
                    tool = %tool,
                    reason = %reason,
                    "risky tool call blocked"
                );
                let entry = ToolCallEntry::blocked(agent_id, tool, params, reason.clone())?;
                self.record_tool_call(&entry)?;
                return Err(ToolCallError::Blocked {
                    tool: tool.to_string(),
                    reason,
                });
            }

            info!(agent_id = %agent_id, tool = %tool, "risky tool call approved");
        }

        // ── Execute ──────────────────────────────────────────────────────────
        debug!(agent_id = %agent_id, tool = %tool, "executing tool");
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| executor(&params)));
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        // ── Record + detect ──────────────────────────────────────────────────
        match outcome {
            Ok(Ok(result)) => {
                let entry =
                    ToolCallEntry::succeeded(agent_id, tool, params, result.clone(), duration_ms)?;
                self.record_tool_call(&entry)?;
                Ok(result)
            }
            Ok(Err(failure)) => {
                let entry =
                    ToolCallEntry::failed(agent_id, tool, params, failure.to_string(), duration_ms)?;
                if let Err(e) = self.record_tool_call(&entry) {
                    error!(tool = %tool, error = %e, "failed to record tool error");
                }
                Err(ToolCallError::Failed(failure))
            }
            Err(payload) => {
                let message = format!("executor panicked: {}", panic_message(payload.as_ref()));
                match ToolCallEntry::failed(agent_id, tool, params, message, duration_ms) {
                    Ok(entry) => {
                        if let Err(e) = self.record_tool_call(&entry) {
                            error!(tool = %tool, error = %e, "failed to record executor panic");
                        }
                    }
                    Err(e) => error!(tool = %tool, error = %e, "failed to build panic entry"),
                }
                panic::resume_unwind(payload)
            }
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Ask the approval gate. `Err(reason)` means the call must be blocked.
    fn seek_approval(&self, request: &ApprovalRequest) -> Result<(), String> {
        let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
            self.approvals.request_approval(request)
        }));

        match verdict {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(format!("approval denied ({})", request.reasons.join("; "))),
            Ok(Err(e)) => Err(format!("approval unavailable, failing closed: {}", e)),
            Err(_) => Err("approval gate panicked, failing closed".to_string()),
        }
    }

    /// Append a tool call, forward it, and run tool-call detection.
    fn record_tool_call(&self, entry: &ToolCallEntry) -> WardenResult<LedgerRecord> {
        let record = self.commit(Entry::ToolCall(entry.clone()))?;
        self.emit(
            EventType::ToolCall,
            EventLevel::for_status(entry.status),
            record.data.clone(),
        );

        if let Some(alert) = self.detector.analyze_tool_call(self.agent_id(), entry) {
            self.raise(&alert);
        }
        Ok(record)
    }

    fn commit(&self, entry: Entry) -> WardenResult<LedgerRecord> {
        let data = entry.to_value()?;
        let record = self.ledger.append(entry.action(), data)?;
        debug!(
            agent_id = %record.agent_id,
            index = record.index,
            action = %record.action,
            "entry committed"
        );
        Ok(record)
    }

    /// Forward an alert, and chain it when configured.
    fn raise(&self, alert: &AlertEntry) {
        warn!(
            agent_id = %alert.agent_id,
            severity = %alert.severity,
            reason = %alert.reason,
            "anomaly detected"
        );

        if self.options.chain_alerts {
            if let Err(e) = self.commit(Entry::Alert(alert.clone())) {
                error!(agent_id = %alert.agent_id, error = %e, "failed to chain alert");
            }
        }

        match serde_json::to_value(alert) {
            Ok(payload) => self.emit(EventType::Alert, EventLevel::for_severity(alert.severity), payload),
            Err(e) => error!(agent_id = %alert.agent_id, error = %e, "failed to serialize alert"),
        }
    }

    fn emit(&self, event_type: EventType, level: EventLevel, payload: Value) {
        forward(
            self.sink.as_ref(),
            SinkEvent::new(self.agent_id().clone(), event_type, level, payload),
        );
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
