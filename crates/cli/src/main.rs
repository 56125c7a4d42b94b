//! relift - one-shot upgrade task runner
//!
//! Discovers registered upgrade tasks, runs each exactly once (tracked in
//! the SQLite execution ledger), and prints a per-task outcome report.

mod tasks;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use relift_core::application::{PersistFailurePolicy, UpgradeRunner};
use relift_core::domain::{RunReport, TaskOutcome};
use relift_core::port::host_probe::{HostProbe, ProbeError};
use relift_core::port::time_provider::SystemTimeProvider;
use relift_infra_sqlite::{create_pool, run_migrations, SqliteExecutionLedger};
use relift_infra_system::{CommandHostProbe, PidFileHostProbe};
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LEDGER_PATH: &str = "~/.relift/ledger.db";
const DEFAULT_SCOPE: &str = "upgrade";

#[derive(Parser)]
#[command(name = "relift")]
#[command(about = "Run pending upgrade tasks against the managed host application", long_about = None)]
#[command(version)]
struct Cli {
    /// Execution ledger database path
    #[arg(long, env = "RELIFT_LEDGER", default_value = DEFAULT_LEDGER_PATH)]
    ledger: String,

    /// Scope prefix; only tasks registered under it are discovered
    #[arg(long, env = "RELIFT_SCOPE", default_value = DEFAULT_SCOPE)]
    scope: String,

    /// Host controller status command (exit code 0 means running)
    #[arg(long, env = "RELIFT_STATUS_COMMAND")]
    status_command: Option<String>,

    /// Host pid file, used when no status command is configured
    #[arg(long, env = "RELIFT_PID_FILE")]
    pid_file: Option<PathBuf>,

    /// What to do when a completed task cannot be recorded in the ledger
    #[arg(long, value_enum, default_value_t = PersistFailureArg::Warn)]
    on_persist_failure: PersistFailureArg,

    /// Emit the run report as JSON on stdout
    #[arg(long)]
    report_json: bool,

    /// Log format
    #[arg(long, env = "RELIFT_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum PersistFailureArg {
    Warn,
    Abort,
}

impl From<PersistFailureArg> for PersistFailurePolicy {
    fn from(arg: PersistFailureArg) -> Self {
        match arg {
            PersistFailureArg::Warn => PersistFailurePolicy::Warn,
            PersistFailureArg::Abort => PersistFailurePolicy::Abort,
        }
    }
}

/// Probe used when the operator configured neither a status command nor a
/// pid file. Always errs, which the runner maps to "not running".
struct UnconfiguredProbe;

#[async_trait::async_trait]
impl HostProbe for UnconfiguredProbe {
    async fn status(&self) -> std::result::Result<i32, ProbeError> {
        Err(ProbeError::Unavailable(
            "no status command or pid file configured".to_string(),
        ))
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Task")]
    id: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn init_logging(log_format: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("Failed to create env filter");

    match log_format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false))
                .init();
        }
    }
}

fn build_probe(cli: &Cli) -> Result<Arc<dyn HostProbe>> {
    if let Some(command_line) = &cli.status_command {
        let probe = CommandHostProbe::from_command_line(command_line)
            .map_err(|e| anyhow::anyhow!("invalid status command: {}", e))?;
        return Ok(Arc::new(probe));
    }
    if let Some(pid_file) = &cli.pid_file {
        return Ok(Arc::new(PidFileHostProbe::new(pid_file)));
    }
    Ok(Arc::new(UnconfiguredProbe))
}

fn colorize_outcome(outcome: &TaskOutcome) -> String {
    let text = outcome.to_string();
    match outcome {
        TaskOutcome::Completed => text.green().to_string(),
        TaskOutcome::SkippedAlreadyDone | TaskOutcome::SkippedHostMismatch => {
            text.dimmed().to_string()
        }
        TaskOutcome::Declined => text.yellow().to_string(),
        _ => text.red().to_string(),
    }
}

fn print_report(report: &RunReport) {
    if report.tasks.is_empty() {
        println!("{}", "No upgrade tasks in scope".yellow());
        return;
    }

    let rows: Vec<ReportRow> = report
        .tasks
        .iter()
        .map(|t| ReportRow {
            id: t.id.clone(),
            outcome: colorize_outcome(&t.outcome),
            detail: t.error.clone().unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(rows));
    println!();

    let failures = report.count(&TaskOutcome::RollbackFailed)
        + report.count(&TaskOutcome::RolledBack)
        + report.count(&TaskOutcome::PostCheckFailed)
        + report.count(&TaskOutcome::MarkFailed);
    let summary = format!(
        "{} completed, {} skipped, {} declined, {} failed in {} ms",
        report.count(&TaskOutcome::Completed),
        report.count(&TaskOutcome::SkippedAlreadyDone)
            + report.count(&TaskOutcome::SkippedHostMismatch),
        report.count(&TaskOutcome::Declined),
        failures,
        report.elapsed_ms
    );
    if failures == 0 {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.red().bold());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_format);

    info!("relift v{} starting...", relift_core::VERSION);

    let ledger_path = shellexpand::tilde(&cli.ledger).into_owned();
    if let Some(parent) = std::path::Path::new(&ledger_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("can't create ledger directory {}", parent.display()))?;
    }

    info!(ledger = %ledger_path, "Opening execution ledger...");
    let pool = create_pool(&ledger_path)
        .await
        .map_err(|e| anyhow::anyhow!("Ledger pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .context("Ledger storage unreadable")?;

    let ledger = Arc::new(SqliteExecutionLedger::new(pool));
    let probe = build_probe(&cli)?;
    let time_provider = Arc::new(SystemTimeProvider);

    let registry = tasks::builtin_registry();
    info!(
        scope = %cli.scope,
        registered = registry.len(),
        "Task registry assembled"
    );

    let runner = UpgradeRunner::new(registry, ledger.clone(), probe, time_provider)
        .with_persist_failure_policy(cli.on_persist_failure.into());

    let report = runner
        .run(&cli.scope)
        .await
        .context("Upgrade run aborted")?;

    if cli.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    match ledger.record_count().await {
        Ok(count) => info!("Ledger now holds {} execution records", count),
        Err(e) => warn!("can't read the ledger record count: {}", e),
    }
    info!("Finished in {} ms", report.elapsed_ms);
    Ok(())
}
