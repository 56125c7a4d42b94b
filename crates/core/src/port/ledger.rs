// Execution Ledger Port (Interface)

use crate::error::Result;
use async_trait::async_trait;

/// Durable record of which task identities have been executed.
///
/// An identity present in the ledger is always treated as "already
/// executed" and is never re-run, regardless of host state. The ledger is
/// constructed explicitly and passed to the runner - it is not process
/// global state.
#[async_trait]
pub trait ExecutionLedger: Send + Sync {
    /// True iff the ledger holds a record for this task identity
    async fn was_executed(&self, task_id: &str) -> Result<bool>;

    /// Last execution timestamp (epoch ms) for reporting.
    /// `None` when the task was never executed.
    async fn last_execution_time(&self, task_id: &str) -> Result<Option<i64>>;

    /// Insert/overwrite the record for `task_id` and flush to durable
    /// storage before returning.
    ///
    /// # Errors
    /// `EngineError::LedgerPersist` when the record could not be made
    /// durable. The execute phase already ran at that point; the runner
    /// reports the task as failed-to-record rather than re-running it.
    async fn mark_executed(&self, task_id: &str, executed_at_millis: i64) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::EngineError;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory ledger for testing
    pub struct MemoryLedger {
        records: Arc<Mutex<HashMap<String, i64>>>,
        fail_persist: Arc<Mutex<bool>>,
        fail_reads: Arc<Mutex<bool>>,
    }

    impl MemoryLedger {
        pub fn new() -> Self {
            Self {
                records: Arc::new(Mutex::new(HashMap::new())),
                fail_persist: Arc::new(Mutex::new(false)),
                fail_reads: Arc::new(Mutex::new(false)),
            }
        }

        /// Pre-seed a record, as if a previous run completed the task
        pub fn with_record(self, task_id: impl Into<String>, executed_at: i64) -> Self {
            self.records
                .lock()
                .unwrap()
                .insert(task_id.into(), executed_at);
            self
        }

        /// Make every subsequent mark_executed fail
        pub fn fail_next_persists(&self) {
            *self.fail_persist.lock().unwrap() = true;
        }

        /// Make every subsequent was_executed/last_execution_time fail,
        /// as if the backing store became unreadable mid-run
        pub fn fail_reads(&self) {
            *self.fail_reads.lock().unwrap() = true;
        }

        pub fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    impl Default for MemoryLedger {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ExecutionLedger for MemoryLedger {
        async fn was_executed(&self, task_id: &str) -> Result<bool> {
            if *self.fail_reads.lock().unwrap() {
                return Err(EngineError::LedgerRead(format!(
                    "mock read failure for {}",
                    task_id
                )));
            }
            Ok(self.records.lock().unwrap().contains_key(task_id))
        }

        async fn last_execution_time(&self, task_id: &str) -> Result<Option<i64>> {
            if *self.fail_reads.lock().unwrap() {
                return Err(EngineError::LedgerRead(format!(
                    "mock read failure for {}",
                    task_id
                )));
            }
            Ok(self.records.lock().unwrap().get(task_id).copied())
        }

        async fn mark_executed(&self, task_id: &str, executed_at_millis: i64) -> Result<()> {
            if *self.fail_persist.lock().unwrap() {
                return Err(EngineError::LedgerPersist(format!(
                    "mock persist failure for {}",
                    task_id
                )));
            }
            self.records
                .lock()
                .unwrap()
                .insert(task_id.to_string(), executed_at_millis);
            Ok(())
        }
    }
}
