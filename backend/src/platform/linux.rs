//! Linux accessor backed by `/proc`.

use super::{send_unix_signal, ProcessAccessor};
use crate::types::{ProcError, RawProcess, RawState, SignalMode};
use procfs::process::Process;
use std::path::Path;
use tracing::trace;

/// Reads the process table through `procfs` and signals with `nix`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcfsAccessor;

impl ProcfsAccessor {
    pub fn new() -> Self {
        ProcfsAccessor
    }
}

impl ProcessAccessor for ProcfsAccessor {
    fn enumerate(&self) -> Result<Vec<RawProcess>, ProcError> {
        let all_procs = procfs::process::all_processes()
            .map_err(|e| ProcError::AccessFailure(format!("Failed to read /proc: {}", e)))?;

        let mut processes = Vec::new();
        for proc_result in all_procs {
            // The directory vanished between readdir and open.
            let Ok(proc) = proc_result else { continue };
            let Ok(pid) = u32::try_from(proc.pid()) else { continue };

            match proc.stat() {
                Ok(stat) => processes.push(RawProcess::new(
                    pid,
                    stat.comm,
                    RawState::from_stat_char(stat.state),
                )),
                Err(e) => {
                    trace!(pid, error = %e, "stat unreadable, process likely exited");
                    processes.push(RawProcess::vanished(pid));
                }
            }
        }

        Ok(processes)
    }

    fn signal(&self, pid: u32, mode: SignalMode) -> Result<(), ProcError> {
        send_unix_signal(pid, mode)
    }

    fn is_running(&self, pid: u32) -> Result<bool, ProcError> {
        let Ok(raw) = i32::try_from(pid) else {
            return Ok(false);
        };
        let stat = match Process::new(raw).and_then(|p| p.stat()) {
            Ok(stat) => stat,
            Err(procfs::ProcError::NotFound(_)) => return Ok(false),
            Err(_) if !Path::new(&format!("/proc/{}", raw)).exists() => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        Ok(!RawState::from_stat_char(stat.state).is_exited())
    }

    fn start_time(&self, pid: u32) -> Result<Option<u64>, ProcError> {
        let raw = i32::try_from(pid).map_err(|_| ProcError::NotFound(pid))?;
        match Process::new(raw).and_then(|p| p.stat()) {
            Ok(stat) => Ok(Some(stat.starttime)),
            Err(procfs::ProcError::NotFound(_)) => Err(ProcError::NotFound(pid)),
            Err(_) if !Path::new(&format!("/proc/{}", raw)).exists() => {
                Err(ProcError::NotFound(pid))
            }
            Err(e) => Err(e.into()),
        }
    }
}
