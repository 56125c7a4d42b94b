// Relift Infrastructure - SQLite Adapter
// Implements: ExecutionLedger

mod connection;
mod ledger;
mod migration;

pub use connection::create_pool;
pub use ledger::SqliteExecutionLedger;
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for
// EngineError here)
