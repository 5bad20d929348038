//! Simulated agent tools for the reference scenarios.
//!
//! All behavior is hardcoded. No external systems are contacted. Each tool
//! has the executor shape the governor expects: `&Value -> Result<Value, _>`.

use std::{thread, time::Duration};

use serde_json::{json, Value};
use thiserror::Error;

/// How long `generate_report` takes.
pub const REPORT_DELAY_MS: u64 = 40;

/// Failures the simulated tools can return.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("upstream timed out after {0} ms")]
    Timeout(u64),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("missing parameter '{0}'")]
    MissingParam(&'static str),
}

fn param<'a>(params: &'a Value, name: &'static str) -> Result<&'a str, ToolError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or(ToolError::MissingParam(name))
}

/// Return two canned results for `query`.
pub fn web_search(params: &Value) -> Result<Value, ToolError> {
    let query = param(params, "query")?;
    Ok(json!({
        "query": query,
        "results": [
            { "title": "Rust ownership explained", "url": "https://example.org/ownership" },
            { "title": "Hash chains for audit logs", "url": "https://example.org/hash-chains" }
        ]
    }))
}

/// Always times out.
pub fn weather_api(_params: &Value) -> Result<Value, ToolError> {
    Err(ToolError::Timeout(3000))
}

/// Succeeds after `REPORT_DELAY_MS`.
pub fn generate_report(params: &Value) -> Result<Value, ToolError> {
    let title = param(params, "title")?;
    thread::sleep(Duration::from_millis(REPORT_DELAY_MS));
    Ok(json!({ "title": title, "pages": 12 }))
}

pub fn database_modify(params: &Value) -> Result<Value, ToolError> {
    param(params, "query")?;
    Ok(json!({ "rowsAffected": 42 }))
}

pub fn file_write(params: &Value) -> Result<Value, ToolError> {
    let path = param(params, "path")?;
    let bytes = params.get("contents").and_then(Value::as_str).map_or(0, str::len);
    Ok(json!({ "path": path, "bytesWritten": bytes }))
}

/// The sandbox refuses every command.
pub fn shell_exec(params: &Value) -> Result<Value, ToolError> {
    let command = param(params, "command")?;
    Err(ToolError::PermissionDenied(format!("sandbox refused '{}'", command)))
}
