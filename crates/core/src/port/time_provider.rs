// Time Source Port - stamps ledger records and run reports

/// Clock abstraction so ledger timestamps and report elapsed times can be
/// pinned in tests
pub trait TimeProvider: Send + Sync {
    /// Current time as milliseconds since the Unix epoch, the unit the
    /// execution ledger stores
    fn now_millis(&self) -> i64;
}

/// Wall-clock provider used by the real wiring
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Frozen clock: always reports the instant it was constructed with
    pub struct FixedTimeProvider {
        now: i64,
    }

    impl FixedTimeProvider {
        pub fn new(now_millis: i64) -> Self {
            Self { now: now_millis }
        }
    }

    impl TimeProvider for FixedTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now
        }
    }
}
