// Host probe implementations
//
// Two ways to ask the host controller "are you running?":
// - CommandHostProbe: run the controller's status command, use its exit code
// - PidFileHostProbe: read a pid file and check process liveness via sysinfo

use async_trait::async_trait;
use relift_core::port::{HostProbe, ProbeError};
use std::path::PathBuf;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};
use tokio::process::Command;
use tracing::debug;

/// Probe that shells out to the host controller's status command.
///
/// Exit code semantics follow the controller contract: 0 means running,
/// anything else means stopped.
pub struct CommandHostProbe {
    program: String,
    args: Vec<String>,
}

impl CommandHostProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a full command line ("bin/controller status") into a probe
    pub fn from_command_line(command_line: &str) -> Result<Self, ProbeError> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ProbeError::Unavailable("empty status command".to_string()))?;
        Ok(Self::new(program, parts.map(String::from).collect()))
    }
}

#[async_trait]
impl HostProbe for CommandHostProbe {
    async fn status(&self) -> Result<i32, ProbeError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| ProbeError::CommandFailed(format!("{}: {}", self.program, e)))?;

        let code = output
            .status
            .code()
            .ok_or_else(|| ProbeError::CommandFailed("terminated by signal".to_string()))?;

        debug!(program = %self.program, code = code, "Status command finished");
        Ok(code)
    }
}

/// Probe that reads the host's pid file and checks whether that process
/// is still alive.
pub struct PidFileHostProbe {
    pid_file: PathBuf,
    system: Mutex<System>,
}

impl PidFileHostProbe {
    pub fn new(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
            system: Mutex::new(System::new_with_specifics(
                RefreshKind::new().with_processes(ProcessRefreshKind::new()),
            )),
        }
    }

    fn read_pid(&self) -> Result<u32, ProbeError> {
        let content = std::fs::read_to_string(&self.pid_file)
            .map_err(|e| ProbeError::IoError(format!("{}: {}", self.pid_file.display(), e)))?;
        content
            .trim()
            .parse::<u32>()
            .map_err(|e| ProbeError::Unavailable(format!("malformed pid file: {}", e)))
    }
}

#[async_trait]
impl HostProbe for PidFileHostProbe {
    async fn status(&self) -> Result<i32, ProbeError> {
        let pid = self.read_pid()?;

        let mut sys = self.system.lock().unwrap();
        sys.refresh_processes();
        let alive = sys.process(Pid::from_u32(pid)).is_some();

        debug!(pid = pid, alive = alive, "Checked pid file process");
        // Mirror controller exit codes: 0 running, 1 stopped
        Ok(if alive { 0 } else { 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn command_probe_maps_exit_codes() {
        let probe = CommandHostProbe::from_command_line("true").unwrap();
        assert_eq!(probe.status().await.unwrap(), 0);

        let probe = CommandHostProbe::from_command_line("false").unwrap();
        assert_eq!(probe.status().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn command_probe_reports_spawn_failures() {
        let probe = CommandHostProbe::new("/nonexistent/controller", vec!["status".to_string()]);
        assert!(matches!(
            probe.status().await,
            Err(ProbeError::CommandFailed(_))
        ));
    }

    #[test]
    fn empty_command_line_is_rejected() {
        assert!(CommandHostProbe::from_command_line("   ").is_err());
    }

    #[tokio::test]
    async fn missing_pid_file_is_an_io_error() {
        let probe = PidFileHostProbe::new("/nonexistent/relift-test.pid");
        assert!(matches!(probe.status().await, Err(ProbeError::IoError(_))));
    }

    #[tokio::test]
    async fn own_pid_is_reported_running() {
        let dir = std::env::temp_dir().join("relift-probe-test");
        std::fs::create_dir_all(&dir).unwrap();
        let pid_file = dir.join("host.pid");
        std::fs::write(&pid_file, format!("{}\n", std::process::id())).unwrap();

        let probe = PidFileHostProbe::new(&pid_file);
        assert_eq!(probe.status().await.unwrap(), 0);

        let _ = std::fs::remove_file(&pid_file);
    }

    #[tokio::test]
    async fn malformed_pid_file_is_unavailable() {
        let dir = std::env::temp_dir().join("relift-probe-test");
        std::fs::create_dir_all(&dir).unwrap();
        let pid_file = dir.join("garbage.pid");
        std::fs::write(&pid_file, "not-a-pid").unwrap();

        let probe = PidFileHostProbe::new(&pid_file);
        assert!(matches!(
            probe.status().await,
            Err(ProbeError::Unavailable(_))
        ));

        let _ = std::fs::remove_file(&pid_file);
    }
}
