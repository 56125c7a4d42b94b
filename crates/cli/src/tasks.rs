//! Built-in task registrations
//!
//! The registry replaces runtime type scanning: every task crate linked
//! into this binary adds its registrations here, under a scope path that
//! the `--scope` filter matches against.

use relift_core::application::TaskRegistry;
use relift_core::domain::{PhaseResult, UpgradeTask};

/// Assemble the registry of all tasks shipped with this binary.
pub fn builtin_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();

    registry.register("upgrade/ledger/self-check", || {
        Ok(Box::new(LedgerSelfCheckTask) as Box<dyn UpgradeTask>)
    });

    registry
}

/// Smoke-test task: verifies the lifecycle plumbing and that the ledger
/// write path works on this installation. Requires the host stopped, does
/// no destructive work.
struct LedgerSelfCheckTask;

#[async_trait::async_trait]
impl UpgradeTask for LedgerSelfCheckTask {
    fn id(&self) -> &str {
        "ledger-self-check"
    }

    fn description(&self) -> &str {
        "Verify upgrade runner and ledger plumbing"
    }

    fn requires_host_running(&self) -> bool {
        false
    }

    async fn pre_execute(&self) -> PhaseResult {
        Ok(())
    }

    async fn execute(&self) -> PhaseResult {
        Ok(())
    }

    async fn rollback(&self) -> PhaseResult {
        Ok(())
    }

    async fn post_execute(&self) -> PhaseResult {
        Ok(())
    }
}
