//! Warden Agent Audit Core: Demo CLI
//!
//! Runs one or all of the reference scenarios, optionally exporting every
//! agent's chain as JSON, and verifies exported chains.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- decisions
//!   cargo run -p demo -- blocked-mutation
//!   cargo run -p demo -- tool-failures
//!   cargo run -p demo -- communications
//!   cargo run -p demo -- --export-dir out run-all
//!   cargo run -p demo -- verify out/decision-screening-A1.json
//!   cargo run -p demo -- --config crates/warden-scenarios/config/warden.toml run-all

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_contracts::error::{WardenError, WardenResult};
use warden_core::sink::{QueuedSink, TracingSink};
use warden_scenarios::{
    scenarios::{blocked_mutation, communications, decision_screening, tool_failures},
    ScenarioContext, ScenarioRun, WardenConfig,
};
use warden_verify::ChainVerifier;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Warden: tamper-evident audit and governance for AI agents.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Warden agent audit core demo",
    long_about = "Runs Warden reference scenarios showing risk screening, the approval\n\
                  gate, anomaly detection, and hash-chain verification."
)]
struct Cli {
    /// Combined warden.toml with [risk], [detector], [governor], [ledger].
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write each agent's chain to <DIR>/<scenario>-<agent>.json.
    #[arg(long, global = true, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: Decision Screening (confidence alerts).
    Decisions,
    /// Scenario 2: Blocked Mutation (approval gate, fail closed).
    BlockedMutation,
    /// Scenario 3: Tool Failures (exactly one record per call).
    ToolFailures,
    /// Scenario 4: Agent Communications (independent chains, forged export).
    Communications,
    /// Verify an exported chain file.
    Verify {
        /// Path to a JSON export written with --export-dir.
        file: PathBuf,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=info to see every audit event.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Verify { file } => verify_file(file),
        scenario => {
            print_banner();
            run_scenarios(&cli, scenario)
        }
    };

    match result {
        Ok(true) => println!("Done."),
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_scenarios(cli: &Cli, command: &Command) -> WardenResult<bool> {
    let config = match &cli.config {
        Some(path) => WardenConfig::from_file(path)?,
        None => WardenConfig::default(),
    };

    let observer = Arc::new(QueuedSink::spawn(Arc::new(TracingSink))?);
    let ctx = ScenarioContext::new(config).with_observer(observer.clone());

    let runs = match command {
        Command::RunAll => warden_scenarios::run_all(&ctx)?,
        Command::Decisions => vec![decision_screening::run_scenario(&ctx)?],
        Command::BlockedMutation => vec![blocked_mutation::run_scenario(&ctx)?],
        Command::ToolFailures => vec![tool_failures::run_scenario(&ctx)?],
        Command::Communications => vec![communications::run_scenario(&ctx)?],
        Command::Verify { .. } => Vec::new(),
    };
    observer.shutdown();

    if let Some(dir) = &cli.export_dir {
        for run in &runs {
            export_run(dir, run)?;
        }
    }

    Ok(runs.iter().all(ScenarioRun::all_verified))
}

fn export_run(dir: &Path, run: &ScenarioRun) -> WardenResult<()> {
    fs::create_dir_all(dir).map_err(|e| WardenError::ConfigError {
        reason: format!("cannot create export directory '{}': {}", dir.display(), e),
    })?;

    for chain in &run.chains {
        let path = dir.join(format!("{}-{}.json", run.name, chain.export.agent_id));
        let text = serde_json::to_string_pretty(&chain.export)?;
        fs::write(&path, text).map_err(|e| WardenError::ConfigError {
            reason: format!("cannot write export '{}': {}", path.display(), e),
        })?;
        info!(path = %path.display(), records = chain.export.records.len(), "chain exported");
        println!("Exported {}", path.display());
    }
    Ok(())
}

// ── Verification ──────────────────────────────────────────────────────────────

fn verify_file(path: &Path) -> WardenResult<bool> {
    let text = fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
        reason: format!("cannot read '{}': {}", path.display(), e),
    })?;
    let report = ChainVerifier::new().verify_str(&text);

    println!("Chain file:        {}", path.display());
    println!("Result:            {}", if report.passed { "VERIFIED" } else { "FAILED" });
    println!("Trusted records:   {}", report.trusted_records);
    if let Some(index) = report.first_untrusted_index {
        println!("Untrusted from:    index {}", index);
    }
    if let Some(kind) = report.hash_kind {
        println!("Hash kind:         {}", kind.as_str());
    }
    if report.reduced_integrity {
        println!("WARNING: non-cryptographic checksum chain; detects accidents, not forgery");
    }
    for failure in &report.failures {
        println!("  [{}] index {}: {}", failure.rule_id, failure.index, failure.message);
    }

    Ok(report.passed)
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Warden: Agent Audit and Governance Core");
    println!("=======================================");
    println!();
    println!("Pipeline per tool call:");
    println!("  [1] Risk check: risky tool list + mutating keywords in params");
    println!("  [2] Approval gate for risky calls (denied or unreachable → BLOCKED)");
    println!("  [3] Execute, timed; executor errors returned unchanged");
    println!("  [4] Exactly one record appended to the agent's hash chain");
    println!("  [5] Anomaly detection; alerts forwarded to the audit sink");
    println!();
}
