// Relift Infrastructure - System Adapters
// Implements: HostProbe (command-based and pid-file-based)

mod host_probe_impl;

pub use host_probe_impl::{CommandHostProbe, PidFileHostProbe};
