// Port Layer - Interfaces for external dependencies

pub mod host_probe;
pub mod ledger;
pub mod time_provider;

// Re-exports
pub use host_probe::{HostProbe, ProbeError};
pub use ledger::ExecutionLedger;
pub use time_provider::TimeProvider;
