// Run Report - per-invocation summary of every task decision

use serde::{Deserialize, Serialize};

/// Terminal state reached by one task during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskOutcome {
    /// Ledger already holds a record for this identity
    SkippedAlreadyDone,
    /// Host running state does not match the task requirement
    SkippedHostMismatch,
    /// pre_execute declined; no rollback, no ledger mark
    Declined,
    /// Full lifecycle succeeded
    Completed,
    /// execute failed, rollback succeeded; no ledger mark
    RolledBack,
    /// execute failed and rollback failed too
    RollbackFailed,
    /// execute succeeded and was marked, post_execute failed
    PostCheckFailed,
    /// execute succeeded but the ledger mark could not be persisted
    MarkFailed,
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutcome::SkippedAlreadyDone => write!(f, "SKIPPED_ALREADY_DONE"),
            TaskOutcome::SkippedHostMismatch => write!(f, "SKIPPED_HOST_MISMATCH"),
            TaskOutcome::Declined => write!(f, "DECLINED"),
            TaskOutcome::Completed => write!(f, "COMPLETED"),
            TaskOutcome::RolledBack => write!(f, "ROLLED_BACK"),
            TaskOutcome::RollbackFailed => write!(f, "ROLLBACK_FAILED"),
            TaskOutcome::PostCheckFailed => write!(f, "POST_CHECK_FAILED"),
            TaskOutcome::MarkFailed => write!(f, "MARK_FAILED"),
        }
    }
}

/// One task's final state and any captured error text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub id: String,
    pub description: String,
    pub outcome: TaskOutcome,
    pub error: Option<String>,
}

/// Summary of one orchestrator invocation, in run order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub host_running: bool,
    pub tasks: Vec<TaskReport>,
    pub elapsed_ms: i64,
}

impl RunReport {
    pub fn outcome_of(&self, id: &str) -> Option<&TaskOutcome> {
        self.tasks.iter().find(|t| t.id == id).map(|t| &t.outcome)
    }

    /// Count of tasks that reached the given outcome
    pub fn count(&self, outcome: &TaskOutcome) -> usize {
        self.tasks.iter().filter(|t| &t.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_display_matches_serde_rename() {
        let json = serde_json::to_string(&TaskOutcome::SkippedHostMismatch).unwrap();
        assert_eq!(json, "\"SKIPPED_HOST_MISMATCH\"");
        assert_eq!(
            TaskOutcome::SkippedHostMismatch.to_string(),
            "SKIPPED_HOST_MISMATCH"
        );
    }

    #[test]
    fn report_lookup_by_id() {
        let report = RunReport {
            host_running: false,
            tasks: vec![
                TaskReport {
                    id: "a".into(),
                    description: "first".into(),
                    outcome: TaskOutcome::Completed,
                    error: None,
                },
                TaskReport {
                    id: "b".into(),
                    description: "second".into(),
                    outcome: TaskOutcome::RolledBack,
                    error: Some("boom".into()),
                },
            ],
            elapsed_ms: 5,
        };

        assert_eq!(report.outcome_of("a"), Some(&TaskOutcome::Completed));
        assert_eq!(report.outcome_of("b"), Some(&TaskOutcome::RolledBack));
        assert_eq!(report.outcome_of("c"), None);
        assert_eq!(report.count(&TaskOutcome::Completed), 1);
    }
}
