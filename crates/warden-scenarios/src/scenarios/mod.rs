//! Reference agent scenarios.
//!
//! Each scenario wires real Warden components (ledger, detector, governor,
//! verifier) to simulated tools and reviewers, prints what happened, and
//! returns the resulting chains for export or inspection.

pub mod blocked_mutation;
pub mod communications;
pub mod decision_screening;
pub mod tool_failures;

use std::sync::Arc;

use warden_contracts::{
    agent::AgentId,
    entry::Severity,
    error::WardenResult,
    event::{EventType, SinkEvent},
    record::LedgerExport,
    verify::ChainReport,
};
use warden_core::{
    sink::{FanoutSink, MemorySink},
    traits::{ApprovalGate, AuditSink},
    Governor,
};
use warden_detect::RuleDetector;
use warden_ledger::AgentLedger;
use warden_verify::ChainVerifier;

use crate::config::WardenConfig;

/// Shared inputs for every scenario.
#[derive(Clone, Default)]
pub struct ScenarioContext {
    pub config: WardenConfig,
    /// Receives every event in addition to the scenario's own recorder.
    pub observer: Option<Arc<dyn AuditSink>>,
}

impl ScenarioContext {
    pub fn new(config: WardenConfig) -> Self {
        Self { config, observer: None }
    }

    pub fn with_observer(mut self, observer: Arc<dyn AuditSink>) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// One agent's chain at the end of a scenario, with its verification.
#[derive(Debug, Clone)]
pub struct AgentChain {
    pub export: LedgerExport,
    pub report: ChainReport,
}

/// Everything a scenario produced.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub name: &'static str,
    pub chains: Vec<AgentChain>,
    /// Every sink event, across all agents, in emission order.
    pub events: Vec<SinkEvent>,
}

impl ScenarioRun {
    pub fn chain(&self, agent_id: &str) -> Option<&AgentChain> {
        self.chains.iter().find(|c| c.export.agent_id.as_str() == agent_id)
    }

    pub fn events_of(&self, event_type: EventType) -> impl Iterator<Item = &SinkEvent> {
        self.events.iter().filter(move |e| e.event_type == event_type)
    }

    /// Severities of every alert raised, in order.
    pub fn alert_severities(&self) -> Vec<Severity> {
        self.events_of(EventType::Alert)
            .filter_map(|e| serde_json::from_value(e.payload["severity"].clone()).ok())
            .collect()
    }

    pub fn all_verified(&self) -> bool {
        self.chains.iter().all(|c| c.report.passed)
    }
}

/// Run every scenario in order.
pub fn run_all(ctx: &ScenarioContext) -> WardenResult<Vec<ScenarioRun>> {
    Ok(vec![
        decision_screening::run_scenario(ctx)?,
        blocked_mutation::run_scenario(ctx)?,
        tool_failures::run_scenario(ctx)?,
        communications::run_scenario(ctx)?,
    ])
}

// ── Harness ───────────────────────────────────────────────────────────────────

/// One governed agent plus handles the scenario keeps for reporting.
pub(crate) struct GovernedAgent {
    pub governor: Governor,
    pub ledger: Arc<AgentLedger>,
}

/// Builds governed agents that all report into one recorder.
pub(crate) struct Harness {
    config: WardenConfig,
    recorder: MemorySink,
    sink: Arc<dyn AuditSink>,
    ledgers: Vec<Arc<AgentLedger>>,
}

impl Harness {
    pub(crate) fn new(ctx: &ScenarioContext) -> Self {
        let recorder = MemorySink::new();
        let mut fanout = FanoutSink::default().with(Arc::new(recorder.clone()));
        if let Some(observer) = &ctx.observer {
            fanout = fanout.with(Arc::clone(observer));
        }
        Self {
            config: ctx.config.clone(),
            recorder,
            sink: Arc::new(fanout),
            ledgers: Vec::new(),
        }
    }

    pub(crate) fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub(crate) fn agent(&mut self, agent_id: &str, approvals: Box<dyn ApprovalGate>) -> WardenResult<GovernedAgent> {
        let detector = RuleDetector::new(self.config.detector.clone())?;
        self.agent_with_detector(agent_id, approvals, detector)
    }

    pub(crate) fn agent_with_detector(
        &mut self,
        agent_id: &str,
        approvals: Box<dyn ApprovalGate>,
        detector: RuleDetector,
    ) -> WardenResult<GovernedAgent> {
        let agent_id = AgentId::new(agent_id);
        let ledger = match self.config.ledger.hash_kind {
            Some(kind) => AgentLedger::with_hash_kind(agent_id, kind)?,
            None => AgentLedger::new(agent_id),
        };
        let ledger = Arc::new(ledger.with_sink(Arc::clone(&self.sink)));
        self.ledgers.push(Arc::clone(&ledger));

        let governor = Governor::new(
            Box::new(Arc::clone(&ledger)),
            Box::new(detector),
            approvals,
            Arc::clone(&self.sink),
        )
        .with_risk_policy(self.config.risk.clone())
        .with_options(self.config.governor.clone());

        Ok(GovernedAgent { governor, ledger })
    }

    /// Export and verify every agent's chain.
    pub(crate) fn finish(self, name: &'static str) -> WardenResult<ScenarioRun> {
        let verifier = ChainVerifier::new();
        let mut chains = Vec::with_capacity(self.ledgers.len());

        for ledger in &self.ledgers {
            let export = ledger.export()?;
            let report = verifier.verify_export(&export);
            println!(
                "  Ledger [{}]:   {} ({} record(s), {})",
                export.agent_id,
                if report.passed { "VERIFIED" } else { "FAILED" },
                export.records.len(),
                export.hash_kind.as_str()
            );
            chains.push(AgentChain { export, report });
        }

        Ok(ScenarioRun {
            name,
            chains,
            events: self.recorder.events(),
        })
    }
}
