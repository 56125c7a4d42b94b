// Host probe port - "is the managed host application running?"

use async_trait::async_trait;
use thiserror::Error;

/// Probe errors
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Probe unavailable: {0}")]
    Unavailable(String),

    #[error("Probe command failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Host probe port.
///
/// Queries the external controller of the managed host application.
/// `status()` mirrors an exit code: `0` means running, anything else
/// means stopped. Callers must treat any error as "not running" - the
/// fail-safe default, since most destructive operations are gated on
/// "stopped" and task authors opt into either state explicitly.
#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Raw controller status, exit-code-like. `0` == running.
    async fn status(&self) -> Result<i32, ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock HostProbe for testing
    pub struct MockHostProbe {
        status: Result<i32, String>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockHostProbe {
        pub fn running() -> Self {
            Self::with_status(Ok(0))
        }

        pub fn stopped() -> Self {
            Self::with_status(Ok(1))
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self::with_status(Err(message.into()))
        }

        fn with_status(status: Result<i32, String>) -> Self {
            Self {
                status,
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        /// How many times the runner queried the probe
        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl HostProbe for MockHostProbe {
        async fn status(&self) -> Result<i32, ProbeError> {
            *self.call_count.lock().unwrap() += 1;
            self.status.clone().map_err(ProbeError::Unavailable)
        }
    }
}
