// SQLite ExecutionLedger Implementation

use async_trait::async_trait;
use relift_core::error::{EngineError, Result};
use relift_core::port::ExecutionLedger;
use sqlx::SqlitePool;

// Helper to convert sqlx::Error to EngineError with structured information
fn map_sqlx_error(err: sqlx::Error) -> EngineError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "5" => {
                        // SQLITE_BUSY - database is locked
                        EngineError::Database(format!(
                            "Ledger locked (SQLITE_BUSY): {}",
                            db_err.message()
                        ))
                    }
                    "13" => {
                        // SQLITE_FULL - database or disk is full
                        EngineError::Database(format!("Ledger store full: {}", db_err.message()))
                    }
                    _ => EngineError::Database(format!(
                        "Ledger error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                EngineError::Database(format!("Ledger error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => EngineError::Database("Row not found".to_string()),
        _ => EngineError::Database(err.to_string()),
    }
}

/// Execution ledger backed by a SQLite file.
///
/// `executions` holds one row per task identity; the WAL journal plus
/// `PRAGMA synchronous=FULL` (set at pool creation) make each mark
/// durable before `mark_executed` returns.
pub struct SqliteExecutionLedger {
    pool: SqlitePool,
}

impl SqliteExecutionLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Total recorded executions, logged by the CLI after a run
    pub async fn record_count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM executions")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ExecutionLedger for SqliteExecutionLedger {
    async fn was_executed(&self, task_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM executions WHERE task_id = ?")
            .bind(task_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count > 0)
    }

    async fn last_execution_time(&self, task_id: &str) -> Result<Option<i64>> {
        let executed_at: Option<i64> =
            sqlx::query_scalar("SELECT executed_at FROM executions WHERE task_id = ?")
                .bind(task_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(executed_at)
    }

    async fn mark_executed(&self, task_id: &str, executed_at_millis: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO executions (task_id, executed_at)
            VALUES (?, ?)
            ON CONFLICT(task_id) DO UPDATE SET executed_at = excluded.executed_at
            "#,
        )
        .bind(task_id)
        .bind(executed_at_millis)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::LedgerPersist(map_sqlx_error(e).to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};

    async fn setup_test_ledger() -> SqliteExecutionLedger {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteExecutionLedger::new(pool)
    }

    #[tokio::test]
    async fn test_mark_and_query() {
        let ledger = setup_test_ledger().await;

        assert!(!ledger.was_executed("storage-reindex").await.unwrap());
        assert_eq!(
            ledger.last_execution_time("storage-reindex").await.unwrap(),
            None
        );

        ledger.mark_executed("storage-reindex", 1234).await.unwrap();

        assert!(ledger.was_executed("storage-reindex").await.unwrap());
        assert_eq!(
            ledger.last_execution_time("storage-reindex").await.unwrap(),
            Some(1234)
        );
    }

    #[tokio::test]
    async fn test_mark_overwrites_existing_record() {
        let ledger = setup_test_ledger().await;

        ledger.mark_executed("config-migrate", 1000).await.unwrap();
        ledger.mark_executed("config-migrate", 2000).await.unwrap();

        assert_eq!(
            ledger.last_execution_time("config-migrate").await.unwrap(),
            Some(2000)
        );
        assert_eq!(ledger.record_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let ledger = setup_test_ledger().await;

        ledger.mark_executed("task-a", 10).await.unwrap();

        assert!(ledger.was_executed("task-a").await.unwrap());
        assert!(!ledger.was_executed("task-b").await.unwrap());
    }
}
