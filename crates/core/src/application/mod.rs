// Application Layer - Discovery and the upgrade runner

pub mod registry;
pub mod runner;

// Re-exports
pub use registry::{TaskFactory, TaskRegistry};
pub use runner::{PersistFailurePolicy, UpgradeRunner};
