//! docgate - compliance gate for generated documentation artifacts
//!
//! Checks the research report, security assessment and orchestration
//! pipeline contract in a working tree and exits non-zero on any violation.
//!
//! ## Exit codes
//!
//! - `0`: validation passed
//! - `1`: policy violations, or research changed without security
//! - `2`: the gate itself could not run (unreadable artifact, bad config)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};

use docgate_core::{
    ChangeMode, EvaluationReport, EvaluationRequest, GateConfig, PolicyEngine, ReportDocument,
    Stage,
};

#[derive(Parser)]
#[command(name = "docgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate research, security and pipeline documentation artifacts", long_about = None)]
struct Cli {
    /// Only require artifacts touched since the base ref, and enforce the
    /// research/security co-change rule
    #[arg(long)]
    changed_only: bool,

    /// Base ref for change detection (default: origin/main)
    #[arg(long)]
    base_ref: Option<String>,

    /// Which artifacts are required for this run
    #[arg(long, value_enum, default_value_t = StageArg::Full)]
    stage: StageArg,

    /// Repository root the artifact paths are relative to
    #[arg(long, default_value = ".")]
    repo_root: PathBuf,

    /// Give up on change detection after this many seconds
    #[arg(long, env = "DOCGATE_DIFF_TIMEOUT_SECS")]
    diff_timeout_secs: Option<u64>,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StageArg {
    Research,
    Security,
    Pipeline,
    Full,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Research => Stage::Research,
            StageArg::Security => Stage::Security,
            StageArg::Pipeline => Stage::Pipeline,
            StageArg::Full => Stage::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    docgate_core::init_tracing(cli.json, level);

    match cmd_validate(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Evaluate the working tree, print the report, and return the exit code.
fn cmd_validate(cli: &Cli) -> Result<u8> {
    let config = GateConfig::default()
        .with_repo_root(&cli.repo_root)
        .with_diff_timeout(cli.diff_timeout_secs);
    config.validate().context("Invalid gate configuration")?;

    let request = build_request(cli, &config);
    info!(
        stage = %request.stage,
        changed_only = cli.changed_only,
        repo_root = %cli.repo_root.display(),
        "Starting validation"
    );

    let engine = PolicyEngine::for_working_tree(config);
    let report = engine
        .evaluate(&request)
        .context("Validation could not complete")?;

    match cli.format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => print_json(&report)?,
    }

    Ok(report.exit_code() as u8)
}

fn build_request(cli: &Cli, config: &GateConfig) -> EvaluationRequest {
    let change_mode = if cli.changed_only {
        let base_ref = cli
            .base_ref
            .clone()
            .unwrap_or_else(|| config.default_base_ref.clone());
        ChangeMode::changed_since(base_ref)
    } else {
        ChangeMode::FullScan
    };
    EvaluationRequest::new(cli.stage.into(), change_mode)
}

fn print_text(report: &EvaluationReport) {
    if report.gate_blocked {
        for violation in &report.violations {
            eprintln!("ERROR: {violation}");
        }
        return;
    }
    print!("{}", report.render_text());
}

fn print_json(report: &EvaluationReport) -> Result<()> {
    let doc = ReportDocument::from(report);
    let out = serde_json::to_string_pretty(&doc).context("Failed to serialize report")?;
    println!("{out}");
    Ok(())
}
