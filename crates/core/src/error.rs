// Central Error Type for the Engine

use thiserror::Error;

/// Engine-level error type.
///
/// Only `Discovery` and `LedgerRead` are fatal for a whole run;
/// `LedgerPersist` is surfaced per task unless the abort policy is set.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Task discovery failed: {0}")]
    Discovery(String),

    #[error("Execution ledger unreadable: {0}")]
    LedgerRead(String),

    #[error("Execution ledger persist failed: {0}")]
    LedgerPersist(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

// Note: sqlx::Error conversion is handled in infra-sqlite
// by converting to EngineError::Database(String)
