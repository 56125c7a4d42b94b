//! Task registry - static, compile-time task discovery
//!
//! Replaces runtime type scanning with an explicit registry: every task
//! crate registers a factory under a scope path (e.g. "storage/reindex")
//! during startup wiring, and `discover` enumerates the registrations
//! that fall under the requested scope.

use crate::domain::UpgradeTask;
use crate::error::{EngineError, Result};
use tracing::debug;

/// Fallible no-argument task constructor
pub type TaskFactory =
    Box<dyn Fn() -> std::result::Result<Box<dyn UpgradeTask>, String> + Send + Sync>;

struct Registration {
    path: String,
    factory: TaskFactory,
}

/// Registry of task factories, keyed by scope path.
///
/// Discovery is all-or-nothing: a single failing factory aborts the whole
/// enumeration, since silently running a subset could skip
/// dependency-relevant tasks.
pub struct TaskRegistry {
    registrations: Vec<Registration>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Register a task factory under a scope path
    pub fn register<F>(&mut self, path: impl Into<String>, factory: F)
    where
        F: Fn() -> std::result::Result<Box<dyn UpgradeTask>, String> + Send + Sync + 'static,
    {
        self.registrations.push(Registration {
            path: path.into(),
            factory: Box::new(factory),
        });
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Instantiate every task registered under `scope` and return them in
    /// run order (lexicographic by task id - stable and total, so two
    /// discoveries over an unchanged registry yield identical sequences).
    ///
    /// # Errors
    /// `EngineError::Discovery` when any factory under the scope fails or
    /// when two tasks share an id. No partial task sets are returned.
    pub fn discover(&self, scope: &str) -> Result<Vec<Box<dyn UpgradeTask>>> {
        let mut tasks: Vec<Box<dyn UpgradeTask>> = Vec::new();

        for reg in &self.registrations {
            if !scope_contains(scope, &reg.path) {
                continue;
            }
            let task = (reg.factory)().map_err(|e| {
                EngineError::Discovery(format!(
                    "can't instantiate task registered at {}: {}",
                    reg.path, e
                ))
            })?;
            debug!(path = %reg.path, id = %task.id(), "Discovered task");
            tasks.push(task);
        }

        tasks.sort_by(|a, b| a.id().cmp(b.id()));

        for pair in tasks.windows(2) {
            if pair[0].id() == pair[1].id() {
                return Err(EngineError::Discovery(format!(
                    "duplicate task id: {}",
                    pair[0].id()
                )));
            }
        }

        Ok(tasks)
    }
}

/// Whole-segment containment: scope "upgrade" covers "upgrade" and
/// "upgrade/storage/a", but not "upgrades/a".
fn scope_contains(scope: &str, path: &str) -> bool {
    match path.strip_prefix(scope) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PhaseResult, UpgradeTask};
    use async_trait::async_trait;

    struct StubTask {
        id: String,
    }

    impl StubTask {
        fn boxed(id: &str) -> std::result::Result<Box<dyn UpgradeTask>, String> {
            Ok(Box::new(StubTask { id: id.to_string() }))
        }
    }

    #[async_trait]
    impl UpgradeTask for StubTask {
        fn id(&self) -> &str {
            &self.id
        }
        fn description(&self) -> &str {
            "stub"
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

    fn registry_with(ids: &[(&str, &str)]) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        for (path, id) in ids {
            let id = id.to_string();
            registry.register(*path, move || StubTask::boxed(&id));
        }
        registry
    }

    #[test]
    fn discover_sorts_lexicographically_by_id() {
        let registry = registry_with(&[
            ("upgrade/c", "charlie"),
            ("upgrade/a", "alpha"),
            ("upgrade/b", "bravo"),
        ]);

        let tasks = registry.discover("upgrade").unwrap();
        let ids: Vec<&str> = tasks.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn discover_is_deterministic() {
        let registry = registry_with(&[
            ("upgrade/x", "x-task"),
            ("upgrade/y", "y-task"),
            ("upgrade/z", "z-task"),
        ]);

        let first: Vec<String> = registry
            .discover("upgrade")
            .unwrap()
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        let second: Vec<String> = registry
            .discover("upgrade")
            .unwrap()
            .iter()
            .map(|t| t.id().to_string())
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn discover_filters_by_scope_prefix() {
        let registry = registry_with(&[
            ("upgrade/storage/a", "storage-a"),
            ("upgrade/storage/b", "storage-b"),
            ("upgrade/network/c", "network-c"),
        ]);

        let tasks = registry.discover("upgrade/storage").unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.id().starts_with("storage")));
    }

    #[test]
    fn scope_matching_stops_at_segment_boundaries() {
        let registry = registry_with(&[
            ("upgrade", "root-task"),
            ("upgrade/storage/a", "storage-a"),
            ("upgrades/other", "lookalike"),
        ]);

        let tasks = registry.discover("upgrade").unwrap();
        let ids: Vec<&str> = tasks.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["root-task", "storage-a"]);
    }

    #[test]
    fn failing_factory_aborts_whole_discovery() {
        let mut registry = registry_with(&[("upgrade/ok", "ok-task")]);
        registry.register("upgrade/broken", || Err("missing prerequisite".to_string()));

        let err = registry.discover("upgrade").unwrap_err();
        match err {
            EngineError::Discovery(msg) => {
                assert!(msg.contains("upgrade/broken"));
                assert!(msg.contains("missing prerequisite"));
            }
            other => panic!("expected Discovery error, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_ids_are_a_discovery_error() {
        let registry = registry_with(&[("upgrade/a", "same-id"), ("upgrade/b", "same-id")]);

        let err = registry.discover("upgrade").unwrap_err();
        assert!(matches!(err, EngineError::Discovery(msg) if msg.contains("same-id")));
    }

    #[test]
    fn out_of_scope_factories_are_never_invoked() {
        let mut registry = registry_with(&[("upgrade/a", "a")]);
        registry.register("other/broken", || Err("should not run".to_string()));

        let tasks = registry.discover("upgrade").unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
