//! Daemon process management.
//!
//! - [`probe`]: platform liveness checks and termination
//! - [`spawn`]: detached background launch
//! - [`controller`]: the start/stop/status lifecycle built on both

pub mod controller;
pub mod probe;
pub mod spawn;

pub use controller::{
    Launcher, Liveness, ProcessController, SelfLauncher, StartOutcome, StatusReport, StopOutcome,
};
#[cfg(unix)]
pub use probe::PosixProbe;
#[cfg(windows)]
pub use probe::WindowsProbe;
pub use probe::{ProbeError, ProcessProbe, platform_probe};
pub use spawn::spawn_detached;
