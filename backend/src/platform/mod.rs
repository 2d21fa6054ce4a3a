//! Per-OS process table access.
//!
//! Each supported platform provides a [`ProcessAccessor`]; [`NativeAccessor`]
//! names the one picked for the current build target.

#[cfg(target_os = "linux")]
mod linux;
mod portable;

#[cfg(target_os = "linux")]
pub use linux::ProcfsAccessor;
pub use portable::SysinfoAccessor;

use crate::types::{ProcError, RawProcess, SignalMode};

#[cfg(target_os = "linux")]
pub type NativeAccessor = ProcfsAccessor;
#[cfg(not(target_os = "linux"))]
pub type NativeAccessor = SysinfoAccessor;

/// Primitive operations every platform must support.
///
/// Implementations must be callable from several threads at once.
pub trait ProcessAccessor: Send + Sync {
    /// Read the live process table.
    fn enumerate(&self) -> Result<Vec<RawProcess>, ProcError>;

    /// Deliver one termination signal.
    fn signal(&self, pid: u32, mode: SignalMode) -> Result<(), ProcError>;

    /// Whether `pid` is still alive. Exited-but-unreaped processes are not.
    fn is_running(&self, pid: u32) -> Result<bool, ProcError> {
        Ok(self
            .enumerate()?
            .iter()
            .any(|p| p.pid == pid && p.name.is_some() && !p.state.is_exited()))
    }

    /// Platform start time of `pid`, used to tell a process apart from a
    /// later one that reuses its id. `None` when the platform cannot say.
    fn start_time(&self, _pid: u32) -> Result<Option<u64>, ProcError> {
        Ok(None)
    }
}

/// Send SIGTERM or SIGKILL, classifying errno.
#[cfg(unix)]
pub(crate) fn send_unix_signal(pid: u32, mode: SignalMode) -> Result<(), ProcError> {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    // kill(0, ..) addresses our own process group.
    if pid == 0 {
        return Err(ProcError::PermissionDenied(pid));
    }
    let raw = i32::try_from(pid).map_err(|_| ProcError::NotFound(pid))?;

    let sig = match mode {
        SignalMode::Graceful => Signal::SIGTERM,
        SignalMode::Forceful => Signal::SIGKILL,
    };

    match signal::kill(Pid::from_raw(raw), sig) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(ProcError::NotFound(pid)),
        Err(Errno::EPERM) => Err(ProcError::PermissionDenied(pid)),
        Err(e) => Err(ProcError::PlatformError(format!(
            "Failed to send {} to PID {}: {}",
            sig, pid, e
        ))),
    }
}
