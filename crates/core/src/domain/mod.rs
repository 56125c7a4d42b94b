// Domain Layer - Task contract and run reporting

pub mod report;
pub mod task;

// Re-exports
pub use report::{RunReport, TaskOutcome, TaskReport};
pub use task::{PhaseError, PhaseResult, TaskId, UpgradeTask};
