// Migration Runner

use relift_core::error::EngineError;
use sqlx::SqlitePool;
use tracing::info;

/// Run ledger schema migrations.
///
/// # Errors
/// `EngineError::LedgerRead` when the store is unreadable or corrupt;
/// this is fatal for the whole run.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), EngineError> {
    // Check if schema_version table exists
    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| EngineError::LedgerRead(e.to_string()))?;

    let current_version: i64 = if table_exists > 0 {
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(|e| EngineError::LedgerRead(e.to_string()))?
            .unwrap_or(0)
    } else {
        0
    };

    info!("Current ledger schema version: {}", current_version);

    if current_version < 1 {
        info!("Applying migration 001: Initial ledger schema");
        apply_migration(pool, include_str!("../migrations/001_initial_schema.sql")).await?;
    }

    Ok(())
}

/// Apply a single migration SQL file inside a transaction
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<(), EngineError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| EngineError::LedgerRead(e.to_string()))?;

    // Split by semicolon and execute each statement
    for statement in sql.split(';') {
        let clean_statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if !clean_statement.is_empty() {
            sqlx::query(&clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| EngineError::LedgerRead(e.to_string()))?;
        }
    }

    tx.commit()
        .await
        .map_err(|e| EngineError::LedgerRead(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        // Ledger table exists and is empty
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM executions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, 1);
    }
}
