//! Scenario 3: Tool Failures
//!
//! A research agent makes four calls. Every one is recorded exactly once,
//! whatever its outcome, and the executor's own error reaches the caller
//! unchanged.
//!
//!   web_search       → SUCCESS, no alert
//!   weather_api      → ERROR (timeout), no alert
//!   generate_report  → SUCCESS, low "slow execution"
//!   shell_exec       → approved, then ERROR, high alert

use serde_json::json;

use warden_contracts::error::WardenResult;
use warden_detect::RuleDetector;

use crate::approvals::ScriptedApproval;
use crate::mock_tools::{self, REPORT_DELAY_MS};
use crate::scenarios::{Harness, ScenarioContext, ScenarioRun};

pub const AGENT_ID: &str = "A2";

/// Capped below `REPORT_DELAY_MS` so `generate_report` counts as slow.
const SLOW_THRESHOLD_MS: u64 = REPORT_DELAY_MS / 2;

fn print_outcome<E: std::fmt::Display>(tool: &str, outcome: &Result<serde_json::Value, E>) {
    match outcome {
        Ok(result) => println!("  {:<16} SUCCESS {}", tool, result),
        Err(e) => println!("  {:<16} FAILED  {}", tool, e),
    }
}

pub fn run_scenario(ctx: &ScenarioContext) -> WardenResult<ScenarioRun> {
    println!("=== Scenario 3: Tool Failures ===");
    println!();

    let mut harness = Harness::new(ctx);
    let mut detector_config = harness.config().detector.clone();
    detector_config.slow_threshold_ms = detector_config.slow_threshold_ms.min(SLOW_THRESHOLD_MS);
    let detector = RuleDetector::new(detector_config)?;

    let agent = harness.agent_with_detector(AGENT_ID, Box::new(ScriptedApproval::new([true])), detector)?;
    let governor = &agent.governor;

    let outcome = governor.intercept_tool_call(
        "web_search",
        json!({ "query": "tamper-evident audit logs" }),
        mock_tools::web_search,
    );
    print_outcome("web_search", &outcome);

    let outcome = governor.intercept_tool_call("weather_api", json!({ "city": "Oslo" }), mock_tools::weather_api);
    print_outcome("weather_api", &outcome);

    let outcome = governor.intercept_tool_call(
        "generate_report",
        json!({ "title": "Weekly incidents" }),
        mock_tools::generate_report,
    );
    print_outcome("generate_report", &outcome);

    let outcome = governor.intercept_tool_call(
        "shell_exec",
        json!({ "command": "ls /var/log" }),
        mock_tools::shell_exec,
    );
    print_outcome("shell_exec", &outcome);
    println!();

    let run = harness.finish("tool-failures")?;
    println!("  Scenario 3 complete.");
    println!();
    Ok(run)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use warden_contracts::entry::{Entry, Severity, ToolCallStatus};

    use super::*;
    use crate::mock_tools::ToolError;

    #[test]
    fn test_every_call_recorded_once() {
        let run = run_scenario(&ScenarioContext::default()).unwrap();

        let calls: Vec<_> = run
            .chain(AGENT_ID)
            .unwrap()
            .export
            .records
            .iter()
            .map(|r| match r.entry().unwrap() {
                Entry::ToolCall(call) => call,
                other => panic!("unexpected entry {:?}", other),
            })
            .collect();

        let statuses: Vec<ToolCallStatus> = calls.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                ToolCallStatus::Success,
                ToolCallStatus::Error,
                ToolCallStatus::Success,
                ToolCallStatus::Error
            ]
        );
        assert_eq!(calls[1].error.as_deref(), Some("upstream timed out after 3000 ms"));
        assert!(calls[1].result.is_none());
        assert!(calls[2].duration_ms >= REPORT_DELAY_MS);
        assert_eq!(run.alert_severities(), vec![Severity::Low, Severity::High]);
        assert!(run.all_verified());
    }

    /// The caller gets back the executor's own error value.
    #[test]
    fn test_failure_reaches_caller_unchanged() {
        let mut harness = Harness::new(&ScenarioContext::default());
        let agent = harness.agent(AGENT_ID, Box::new(ScriptedApproval::unavailable())).unwrap();

        let failure = agent
            .governor
            .intercept_tool_call("weather_api", json!({}), mock_tools::weather_api)
            .unwrap_err()
            .into_failure();
        assert_eq!(failure, Some(ToolError::Timeout(3000)));
        assert_eq!(agent.ledger.len(), 1);
    }

    #[test]
    fn test_bad_params_still_recorded() {
        let mut harness = Harness::new(&ScenarioContext::default());
        let agent = harness.agent(AGENT_ID, Box::new(ScriptedApproval::unavailable())).unwrap();

        let failure = agent
            .governor
            .intercept_tool_call("web_search", json!({ "q": "typo" }), mock_tools::web_search)
            .unwrap_err()
            .into_failure();
        assert_eq!(failure, Some(ToolError::MissingParam("query")));
        assert_eq!(agent.ledger.len(), 1);
    }
}
