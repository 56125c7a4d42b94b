// Upgrade Task Contract

use async_trait::async_trait;
use thiserror::Error;

/// Task identity (unique within a run)
pub type TaskId = String;

/// Recoverable failure raised by a lifecycle phase.
///
/// Phase failures are expected control flow for the runner, not panics:
/// each lifecycle method hands back a `PhaseResult` and the runner's state
/// machine decides what happens next.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PhaseError {
    pub message: String,
}

impl PhaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for PhaseError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for PhaseError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Result type for lifecycle phases
pub type PhaseResult = std::result::Result<(), PhaseError>;

/// The upgrade task capability.
///
/// A task is constructed once per discovery, used for exactly one
/// lifecycle pass, then discarded. It owns no persisted state; everything
/// durable lives in the execution ledger.
///
/// Lifecycle order: `pre_execute` -> `execute` -> `post_execute`, with
/// `rollback` invoked only when `execute` fails.
#[async_trait]
pub trait UpgradeTask: Send + Sync {
    /// Unique task identity. Ledger key and sort key for run order.
    fn id(&self) -> &str;

    /// Human-readable description for the operator transcript.
    fn description(&self) -> &str;

    /// Whether the managed host application must be running for this
    /// task to apply. Fixed at discovery time.
    fn requires_host_running(&self) -> bool;

    /// Pre-check phase. A failure here means "don't run me now": the task
    /// is skipped without rollback and without a ledger mark.
    async fn pre_execute(&self) -> PhaseResult;

    /// Execution phase. A failure triggers a rollback attempt.
    async fn execute(&self) -> PhaseResult;

    /// Undo a failed execute phase.
    async fn rollback(&self) -> PhaseResult;

    /// Post-check phase. Runs only after a successful (and ledger-marked)
    /// execute.
    async fn post_execute(&self) -> PhaseResult;
}

impl std::fmt::Debug for dyn UpgradeTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeTask").field("id", &self.id()).finish()
    }
}
