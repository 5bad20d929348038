//! Scenario 1: Decision Screening
//!
//! A routing agent logs three decisions with falling confidence. Every
//! decision is committed to the ledger; the detector screens each one after
//! it is committed.
//!
//!   confidence 0.9 → no alert
//!   confidence 0.3 → medium "low confidence"
//!   confidence 0.1 → critical "extremely low confidence"

use serde_json::json;

use warden_contracts::error::WardenResult;

use crate::approvals::ScriptedApproval;
use crate::scenarios::{Harness, ScenarioContext, ScenarioRun};

pub const AGENT_ID: &str = "A1";

/// (confidence, chosen route) for each decision.
const DECISIONS: [(f64, &str); 3] = [
    (0.9, "billing-support"),
    (0.3, "technical-support"),
    (0.1, "escalate-to-human"),
];

pub fn run_scenario(ctx: &ScenarioContext) -> WardenResult<ScenarioRun> {
    println!("=== Scenario 1: Decision Screening ===");
    println!();

    let mut harness = Harness::new(ctx);
    let agent = harness.agent(AGENT_ID, Box::new(ScriptedApproval::unavailable()))?;

    for (step, (confidence, route)) in DECISIONS.iter().enumerate() {
        let logged = agent.governor.log_decision(
            json!({ "ticket": format!("T-{}", 1000 + step), "channel": "email" }),
            json!({ "route": route }),
            *confidence,
        )?;

        println!("  Decision {}:     route={} confidence={:.1}", step + 1, route, confidence);
        println!("  Record index:   {}", logged.record.index);
        match &logged.alert {
            Some(alert) => println!("  Alert:          [{}] {}", alert.severity, alert.reason),
            None => println!("  Alert:          none"),
        }
        println!();
    }

    let run = harness.finish("decision-screening")?;
    println!("  Scenario 1 complete.");
    println!();
    Ok(run)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use warden_contracts::{entry::Severity, event::EventType};

    use super::*;

    #[test]
    fn test_alerts_on_second_and_third_decision() {
        let run = run_scenario(&ScenarioContext::default()).unwrap();

        assert_eq!(run.alert_severities(), vec![Severity::Medium, Severity::Critical]);

        let chain = run.chain(AGENT_ID).unwrap();
        assert_eq!(chain.export.records.len(), 3);
        assert_eq!(chain.export.records.last().unwrap().index, 3);
        assert!(chain.report.passed);
    }

    /// Alerts stay out of the ledger unless chaining is switched on.
    #[test]
    fn test_alerts_chained_when_enabled() {
        let mut ctx = ScenarioContext::default();
        ctx.config.governor.chain_alerts = true;

        let run = run_scenario(&ctx).unwrap();
        let actions: Vec<&str> = run.chain(AGENT_ID).unwrap().export.records.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(actions, vec!["DECISION", "DECISION", "ALERT", "DECISION", "ALERT"]);
        assert!(run.all_verified());
    }

    #[test]
    fn test_every_decision_is_emitted() {
        let run = run_scenario(&ScenarioContext::default()).unwrap();
        assert_eq!(run.events_of(EventType::Decision).count(), 3);
        assert_eq!(run.events_of(EventType::Ledger).count(), 3);
    }
}
