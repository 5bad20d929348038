//! Scenario 2: Blocked Mutation
//!
//! Shows the approval gate for risky tool calls.
//!
//! Sub-case A: `database_modify` with a DELETE query. The reviewer denies
//! it, so the call is recorded as BLOCKED, a high alert is raised, and the
//! tool never runs.
//!
//! Sub-case B: `file_write` to a report path. The reviewer approves; the
//! call runs and the detector still flags the risky tool use (medium).
//!
//! Sub-case C: `database_modify` again, but the reviewer never answers. The
//! gate fails closed and the call is blocked.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use warden_contracts::error::WardenResult;

use crate::approvals::ScriptedApproval;
use crate::mock_tools;
use crate::scenarios::{Harness, ScenarioContext, ScenarioRun};

pub const AGENT_ID: &str = "A1";

pub fn run_scenario(ctx: &ScenarioContext) -> WardenResult<ScenarioRun> {
    println!("=== Scenario 2: Blocked Mutation ===");
    println!();

    let reviewer = ScriptedApproval::new([false, true]);
    let requests = reviewer.request_log();

    let mut harness = Harness::new(ctx);
    let agent = harness.agent(AGENT_ID, Box::new(reviewer))?;
    let executions = AtomicUsize::new(0);

    // ── Sub-case A: denied ────────────────────────────────────────────────────

    println!("  ── Sub-case A: reviewer denies a DELETE ──");
    let outcome = agent.governor.intercept_tool_call(
        "database_modify",
        json!({ "query": "DELETE FROM customers WHERE last_login < '2020-01-01'" }),
        |params| {
            executions.fetch_add(1, Ordering::SeqCst);
            mock_tools::database_modify(params)
        },
    );
    match outcome {
        Err(e) if e.is_blocked() => println!("  Outcome:        BLOCKED ({})", e),
        Err(e) => println!("  UNEXPECTED outcome: {}", e),
        Ok(_) => println!("  UNEXPECTED outcome: executed"),
    }
    println!("  Tool executed:  {}", executions.load(Ordering::SeqCst) > 0);
    println!();

    // ── Sub-case B: approved ──────────────────────────────────────────────────

    println!("  ── Sub-case B: reviewer approves a report write ──");
    let outcome = agent.governor.intercept_tool_call(
        "file_write",
        json!({ "path": "/reports/q3.md", "contents": "# Q3 summary" }),
        mock_tools::file_write,
    );
    match outcome {
        Ok(result) => println!("  Outcome:        SUCCESS {}", result),
        Err(e) => println!("  UNEXPECTED outcome: {}", e),
    }
    println!();

    // ── Sub-case C: reviewer unreachable ──────────────────────────────────────

    println!("  ── Sub-case C: reviewer unreachable ──");
    let outcome = agent.governor.intercept_tool_call(
        "database_modify",
        json!({ "query": "DROP TABLE audit_archive" }),
        mock_tools::database_modify,
    );
    match outcome {
        Err(e) if e.is_blocked() => println!("  Outcome:        BLOCKED ({})", e),
        Err(e) => println!("  UNEXPECTED outcome: {}", e),
        Ok(_) => println!("  UNEXPECTED outcome: executed"),
    }
    if let Ok(requests) = requests.lock() {
        println!("  Approval requests sent: {}", requests.len());
    }
    println!();

    let run = harness.finish("blocked-mutation")?;
    println!("  Scenario 2 complete.");
    println!();
    Ok(run)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;

    use warden_contracts::{
        entry::{Entry, Severity, ToolCallStatus},
        event::EventType,
    };
    use warden_core::ToolCallError;

    use super::*;
    use crate::config::WardenConfig;
    use crate::mock_tools::ToolError;

    /// A denied DELETE: one BLOCKED record, one high alert, a blocked
    /// failure, and the executor never runs.
    #[test]
    fn test_denied_delete_is_blocked() {
        let mut harness = Harness::new(&ScenarioContext::default());
        let agent = harness.agent(AGENT_ID, Box::new(ScriptedApproval::new([false]))).unwrap();
        let ran = AtomicBool::new(false);

        let outcome = agent.governor.intercept_tool_call(
            "database_modify",
            json!({ "query": "delete from users" }),
            |params| {
                ran.store(true, Ordering::SeqCst);
                mock_tools::database_modify(params)
            },
        );

        assert!(matches!(outcome, Err(ToolCallError::Blocked { .. })));
        assert!(!ran.load(Ordering::SeqCst));

        let run = harness.finish("test").unwrap();
        let records = &run.chain(AGENT_ID).unwrap().export.records;
        assert_eq!(records.len(), 1);
        match records[0].entry().unwrap() {
            Entry::ToolCall(call) => {
                assert_eq!(call.status, ToolCallStatus::Blocked);
                assert_eq!(call.duration_ms, 0);
                assert!(call.result.is_none());
            }
            other => panic!("expected a tool call record, got {:?}", other),
        }
        assert_eq!(run.alert_severities(), vec![Severity::High]);
        assert!(run.all_verified());
    }

    #[test]
    fn test_full_scenario() {
        let run = run_scenario(&ScenarioContext::default()).unwrap();

        let statuses: Vec<ToolCallStatus> = run
            .chain(AGENT_ID)
            .unwrap()
            .export
            .records
            .iter()
            .filter_map(|r| match r.entry() {
                Ok(Entry::ToolCall(call)) => Some(call.status),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![ToolCallStatus::Blocked, ToolCallStatus::Success, ToolCallStatus::Blocked]
        );
        assert_eq!(
            run.alert_severities(),
            vec![Severity::High, Severity::Medium, Severity::High]
        );
        assert_eq!(run.events_of(EventType::ToolCall).count(), 3);
        assert!(run.all_verified());
    }

    /// A tool made risky only by `[risk]` is still escalated by the detector
    /// when it is denied.
    #[test]
    fn test_denied_configured_tool_raises_high_alert() {
        let config = WardenConfig::from_toml_str("[risk]\nrisky_tools = [\"wire_funds\"]").unwrap();
        let mut harness = Harness::new(&ScenarioContext::new(config));
        let agent = harness.agent(AGENT_ID, Box::new(ScriptedApproval::new([false]))).unwrap();
        assert!(agent.governor.risk_policy().is_risky_tool("wire_funds"));

        let outcome = agent.governor.intercept_tool_call(
            "wire_funds",
            json!({ "amount": 250, "to": "acct-9" }),
            |_| Ok::<_, ToolError>(json!({ "sent": true })),
        );

        assert!(matches!(outcome, Err(ToolCallError::Blocked { .. })));
        let run = harness.finish("test").unwrap();
        assert_eq!(run.alert_severities(), vec![Severity::High]);
    }

    /// The reviewer is told why the call was flagged.
    #[test]
    fn test_reviewer_receives_reasons() {
        let reviewer = ScriptedApproval::new([false]);
        let log = reviewer.request_log();
        let mut harness = Harness::new(&ScenarioContext::default());
        let agent = harness.agent(AGENT_ID, Box::new(reviewer)).unwrap();

        let _ = agent.governor.intercept_tool_call(
            "database_modify",
            json!({ "query": "truncate sessions" }),
            mock_tools::database_modify,
        );

        let requests = log.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].reasons.iter().any(|r| r.contains("database_modify")));
        assert!(requests[0].reasons.iter().any(|r| r.contains("truncate")));
    }

    /// Keyword screening catches non-listed tools too.
    #[test]
    fn test_keyword_makes_safe_tool_risky() {
        let mut harness = Harness::new(&ScenarioContext::default());
        let agent = harness.agent(AGENT_ID, Box::new(ScriptedApproval::unavailable())).unwrap();

        let outcome = agent.governor.intercept_tool_call(
            "web_search",
            json!({ "query": "how to drop a table" }),
            mock_tools::web_search,
        );
        assert!(outcome.is_err_and(|e: ToolCallError<ToolError>| e.is_blocked()));
    }
}
