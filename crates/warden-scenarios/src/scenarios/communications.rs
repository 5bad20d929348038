//! Scenario 4: Agent Communications
//!
//! A planner (A1) hands work to an executor agent (B2) and gets a status
//! report back. Each agent records its side of the exchange in its own
//! ledger; communications skip risk screening entirely.
//!
//! Finally an auditor edits a copy of B2's exported chain and shows that the
//! verifier marks everything from the edited record onward as untrusted.

use serde_json::json;

use warden_contracts::error::WardenResult;
use warden_verify::ChainVerifier;

use crate::approvals::ScriptedApproval;
use crate::scenarios::{Harness, ScenarioContext, ScenarioRun};

pub const PLANNER_ID: &str = "A1";
pub const WORKER_ID: &str = "B2";

pub fn run_scenario(ctx: &ScenarioContext) -> WardenResult<ScenarioRun> {
    println!("=== Scenario 4: Agent Communications ===");
    println!();

    let mut harness = Harness::new(ctx);
    let planner = harness.agent(PLANNER_ID, Box::new(ScriptedApproval::unavailable()))?;
    let worker = harness.agent(WORKER_ID, Box::new(ScriptedApproval::unavailable()))?;

    let task = json!({ "task": "compile-weekly-digest", "to": WORKER_ID, "deadline": "friday" });
    let sent = planner.governor.record_communication("handoff_sent", task.clone())?;
    let received = worker
        .governor
        .record_communication("handoff_received", json!({ "from": PLANNER_ID, "task": task["task"] }))?;
    println!("  {} → {}:  handoff (records {} / {})", PLANNER_ID, WORKER_ID, sent.index, received.index);

    // Communications are never screened, even when they mention mutations.
    let report = json!({ "status": "done", "note": "dropped 3 duplicate rows before writing" });
    let sent = worker.governor.record_communication("status_report", report.clone())?;
    let received = planner
        .governor
        .record_communication("status_received", json!({ "from": WORKER_ID, "report": report }))?;
    println!("  {} → {}:  status report (records {} / {})", WORKER_ID, PLANNER_ID, sent.index, received.index);
    println!();

    // ── Auditor check ─────────────────────────────────────────────────────────
    let mut forged = worker.ledger.export()?;
    if let Some(first) = forged.records.first_mut() {
        first.data["payload"]["task"] = json!("wire-funds");
    }
    let audit = ChainVerifier::new().verify_export(&forged);
    println!(
        "  Forged copy of {}: {} (untrusted from index {})",
        WORKER_ID,
        if audit.passed { "VERIFIED" } else { "REJECTED" },
        audit.first_untrusted_index.map_or("-".to_string(), |i| i.to_string())
    );
    println!();

    let run = harness.finish("communications")?;
    println!("  Scenario 4 complete.");
    println!();
    Ok(run)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
