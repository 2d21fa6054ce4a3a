//! Cross-platform accessor built on `sysinfo`.
//!
//! This is the native accessor everywhere except Linux. A fresh
//! `System` is built per call so nothing is shared between requests.

use super::ProcessAccessor;
use crate::types::{ProcError, RawProcess, RawState, SignalMode};
use sysinfo::{Pid, Process, ProcessStatus, ProcessesToUpdate, System};

#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoAccessor;

impl SysinfoAccessor {
    pub fn new() -> Self {
        SysinfoAccessor
    }

    fn load(pids: ProcessesToUpdate<'_>) -> System {
        let mut sys = System::new();
        sys.refresh_processes(pids, true);
        sys
    }
}

fn raw_state(status: ProcessStatus) -> RawState {
    match status {
        ProcessStatus::Run => RawState::Running,
        ProcessStatus::Sleep | ProcessStatus::Idle | ProcessStatus::UninterruptibleDiskSleep => {
            RawState::Sleeping
        }
        ProcessStatus::Stop | ProcessStatus::Tracing => RawState::Stopped,
        ProcessStatus::Zombie => RawState::Zombie,
        ProcessStatus::Dead => RawState::Dead,
        _ => RawState::Unknown,
    }
}

/// sysinfo lists Linux tasks alongside processes; a task id is not a pid.
/// Kernel threads stay: they are processes in their own right.
#[cfg(target_os = "linux")]
fn is_thread(process: &Process) -> bool {
    matches!(process.thread_kind(), Some(sysinfo::ThreadKind::Userland))
}

#[cfg(not(target_os = "linux"))]
fn is_thread(_process: &Process) -> bool {
    false
}

impl ProcessAccessor for SysinfoAccessor {
    fn enumerate(&self) -> Result<Vec<RawProcess>, ProcError> {
        let sys = Self::load(ProcessesToUpdate::All);
        if sys.processes().is_empty() {
            return Err(ProcError::AccessFailure(
                "platform returned an empty process table".to_string(),
            ));
        }

        let mut processes: Vec<RawProcess> = sys
            .processes()
            .iter()
            .filter(|(_, process)| !is_thread(process))
            .map(|(pid, process)| RawProcess {
                pid: pid.as_u32(),
                name: Some(process.name().to_string_lossy().into_owned()),
                state: raw_state(process.status()),
            })
            .collect();
        // sysinfo hands back a map; pid order is the closest thing to table order.
        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }

    #[cfg(unix)]
    fn signal(&self, pid: u32, mode: SignalMode) -> Result<(), ProcError> {
        super::send_unix_signal(pid, mode)
    }

    #[cfg(not(unix))]
    fn signal(&self, pid: u32, mode: SignalMode) -> Result<(), ProcError> {
        use sysinfo::Signal;
        use tracing::debug;

        let target = Pid::from_u32(pid);
        let sys = Self::load(ProcessesToUpdate::Some(&[target]));
        let process = sys.process(target).ok_or(ProcError::NotFound(pid))?;

        let delivered = match mode {
            SignalMode::Graceful => match process.kill_with(Signal::Term) {
                Some(delivered) => delivered,
                None => {
                    debug!(pid, "no cooperative signal on this platform, killing");
                    process.kill()
                }
            },
            SignalMode::Forceful => process.kill(),
        };

        if delivered {
            Ok(())
        } else {
            Err(ProcError::PlatformError(format!(
                "Failed to send {} termination to PID {}",
                mode, pid
            )))
        }
    }

    fn is_running(&self, pid: u32) -> Result<bool, ProcError> {
        let target = Pid::from_u32(pid);
        let sys = Self::load(ProcessesToUpdate::Some(&[target]));
        Ok(sys
            .process(target)
            .is_some_and(|p| !is_thread(p) && !raw_state(p.status()).is_exited()))
    }

    fn start_time(&self, pid: u32) -> Result<Option<u64>, ProcError> {
        let target = Pid::from_u32(pid);
        let sys = Self::load(ProcessesToUpdate::Some(&[target]));
        sys.process(target)
            .filter(|p| !is_thread(p))
            .map(|p| Some(p.start_time()))
            .ok_or(ProcError::NotFound(pid))
    }
}
