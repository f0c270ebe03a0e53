//! Detached background spawn.
//!
//! The daemon must outlive the command that started it and must not hold on
//! to the operator's terminal. Standard streams go to the null device, the
//! working directory is the project root, and the child gets its own process
//! group (Unix) or a detached, window-less process group (Windows).

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Launches `program args...` fully disconnected from the caller
///
/// Returns the child's PID. The child is not waited on.
///
/// # Errors
///
/// Returns an error if the process cannot be created.
pub fn spawn_detached(program: &Path, args: &[&str], cwd: &Path) -> io::Result<u32> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    debug!(program = %program.display(), ?args, cwd = %cwd.display(), "Spawning detached process");

    let pid = launch(&mut command)?;

    info!(pid, "Detached process spawned");
    Ok(pid)
}

/// Spawns into a new process group so terminal signals to the parent's group
/// never reach the daemon
#[cfg(unix)]
fn launch(command: &mut Command) -> io::Result<u32> {
    use command_group::CommandGroup;

    let child = command.group_spawn()?;
    Ok(child.id())
}

/// Spawns detached from the console in a new process group without a window
#[cfg(windows)]
fn launch(command: &mut Command) -> io::Result<u32> {
    use std::os::windows::process::CommandExt;

    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let child = command
        .creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW)
        .spawn()?;
    Ok(child.id())
}
