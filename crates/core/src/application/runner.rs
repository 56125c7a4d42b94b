//! Upgrade runner - drives the per-task lifecycle state machine
//!
//! Strictly sequential: tasks run one at a time in run order. Individual
//! tasks can perform destructive, order-sensitive side effects, so nothing
//! here is ever spawned or interleaved.

use crate::application::TaskRegistry;
use crate::domain::{RunReport, TaskOutcome, TaskReport, UpgradeTask};
use crate::error::{EngineError, Result};
use crate::port::{ExecutionLedger, HostProbe, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// What to do when a successful execute cannot be recorded durably.
///
/// The fragment of behavior this models only warns and continues; making
/// the policy explicit lets operators opt into aborting instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistFailurePolicy {
    /// Report the task as MARK_FAILED and continue with the next task
    #[default]
    Warn,
    /// Abort the whole run with a LedgerPersist error
    Abort,
}

/// The orchestrator: consults the ledger and the host probe for each
/// discovered task, and runs the four-phase lifecycle with failure
/// containment. One task's failure never halts the run; only discovery
/// and ledger-read problems (and persist failures under the Abort
/// policy) escape `run`.
pub struct UpgradeRunner {
    registry: TaskRegistry,
    ledger: Arc<dyn ExecutionLedger>,
    host_probe: Arc<dyn HostProbe>,
    time_provider: Arc<dyn TimeProvider>,
    persist_failure_policy: PersistFailurePolicy,
}

impl UpgradeRunner {
    pub fn new(
        registry: TaskRegistry,
        ledger: Arc<dyn ExecutionLedger>,
        host_probe: Arc<dyn HostProbe>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            registry,
            ledger,
            host_probe,
            time_provider,
            persist_failure_policy: PersistFailurePolicy::default(),
        }
    }

    pub fn with_persist_failure_policy(mut self, policy: PersistFailurePolicy) -> Self {
        self.persist_failure_policy = policy;
        self
    }

    /// Perform one orchestrator invocation over every task under `scope`.
    ///
    /// # Errors
    /// - `EngineError::Discovery` when task enumeration/instantiation fails
    /// - `EngineError::LedgerRead` when the ledger cannot be queried
    /// - `EngineError::LedgerPersist` only under `PersistFailurePolicy::Abort`
    pub async fn run(&self, scope: &str) -> Result<RunReport> {
        let started = self.time_provider.now_millis();

        let host_running = self.is_host_running().await;
        info!(
            "Host application is currently {}",
            if host_running { "running" } else { "stopped" }
        );

        let tasks = self.registry.discover(scope)?;
        info!(scope = %scope, count = tasks.len(), "Discovered upgrade tasks");

        let mut reports = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let report = self.process_task(task.as_ref(), host_running).await?;
            reports.push(report);
        }

        Ok(RunReport {
            host_running,
            tasks: reports,
            elapsed_ms: self.time_provider.now_millis() - started,
        })
    }

    /// Gate one task (ledger first, host state second) and run its
    /// lifecycle if both gates pass.
    async fn process_task(&self, task: &dyn UpgradeTask, host_running: bool) -> Result<TaskReport> {
        info!("Processing {} : {}", task.id(), task.description());

        let was_executed = self
            .ledger
            .was_executed(task.id())
            .await
            .map_err(|e| EngineError::LedgerRead(e.to_string()))?;

        if was_executed {
            let last = self
                .ledger
                .last_execution_time(task.id())
                .await
                .map_err(|e| EngineError::LedgerRead(e.to_string()))?;
            info!(
                "  Task {} was already executed at {}",
                task.id(),
                format_timestamp(last)
            );
            return Ok(self.report(task, TaskOutcome::SkippedAlreadyDone, None));
        }

        if task.requires_host_running() != host_running {
            if task.requires_host_running() {
                info!(
                    "  Task {} requires the host to be running but it is stopped",
                    task.id()
                );
            } else {
                info!(
                    "  Task {} requires the host to be stopped but it is running",
                    task.id()
                );
            }
            return Ok(self.report(task, TaskOutcome::SkippedHostMismatch, None));
        }

        self.execute_lifecycle(task).await
    }

    /// The four-phase lifecycle for a single gated-in task.
    ///
    /// Phase failures are typed results, not unwinding: each arm of the
    /// state machine maps directly to a terminal TaskOutcome.
    async fn execute_lifecycle(&self, task: &dyn UpgradeTask) -> Result<TaskReport> {
        info!("- Running pre-execution phase");
        if let Err(e) = task.pre_execute().await {
            // A pre-check failure is the task opting out, not a hard error
            info!("  Ignoring {}: {}", task.id(), e.message);
            return Ok(self.report(task, TaskOutcome::Declined, Some(e.message)));
        }

        info!("- Running execution phase");
        if let Err(execute_error) = task.execute().await {
            warn!(
                "  Warning: can't perform the upgrade operation because: {}",
                execute_error.message
            );
            info!("- Executing rollback phase");
            return Ok(match task.rollback().await {
                Ok(()) => self.report(task, TaskOutcome::RolledBack, Some(execute_error.message)),
                Err(rollback_error) => {
                    warn!(
                        "  Warning: can't rollback the upgrade because: {}",
                        rollback_error.message
                    );
                    self.report(
                        task,
                        TaskOutcome::RollbackFailed,
                        Some(format!(
                            "execute: {}; rollback: {}",
                            execute_error.message, rollback_error.message
                        )),
                    )
                }
            });
        }

        // Mark before post_execute so a post-check failure can never
        // cause re-execution on a later run.
        info!("- Saving the execution state");
        let now = self.time_provider.now_millis();
        if let Err(persist_error) = self.ledger.mark_executed(task.id(), now).await {
            match self.persist_failure_policy {
                PersistFailurePolicy::Abort => {
                    return Err(persist_error);
                }
                PersistFailurePolicy::Warn => {
                    let message = persist_error.to_string();
                    warn!(
                        "  Warning: task {} executed but its completion could not be recorded: {}",
                        task.id(),
                        message
                    );
                    return Ok(self.report(task, TaskOutcome::MarkFailed, Some(message)));
                }
            }
        }

        info!("- Running post-execution phase");
        Ok(match task.post_execute().await {
            Ok(()) => self.report(task, TaskOutcome::Completed, None),
            Err(e) => {
                warn!(
                    "  Warning: can't run the post-execute phase because: {}",
                    e.message
                );
                self.report(task, TaskOutcome::PostCheckFailed, Some(e.message))
            }
        })
    }

    /// Best-effort host status. Any probe fault or non-zero status is
    /// mapped to "not running" and never propagated.
    async fn is_host_running(&self) -> bool {
        match self.host_probe.status().await {
            Ok(0) => true,
            Ok(status) => {
                info!(status = status, "Host controller reports non-zero status");
                false
            }
            Err(e) => {
                warn!(
                    "  Warning: can't retrieve the host status (assuming it is not running): {}",
                    e
                );
                false
            }
        }
    }

    fn report(
        &self,
        task: &dyn UpgradeTask,
        outcome: TaskOutcome,
        error: Option<String>,
    ) -> TaskReport {
        TaskReport {
            id: task.id().to_string(),
            description: task.description().to_string(),
            outcome,
            error,
        }
    }
}

fn format_timestamp(millis: Option<i64>) -> String {
    millis
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "an unknown time".to_string())
}
