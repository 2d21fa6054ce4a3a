//! In-memory accessor for unit tests.

use crate::platform::ProcessAccessor;
use crate::types::{ProcError, RawProcess, RawState, SignalMode};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Exits on the first signal.
    Cooperative,
    /// Ignores SIGTERM, dies on SIGKILL.
    IgnoresGraceful,
    /// Survives everything.
    Immune,
    /// Owned by someone else.
    Foreign,
    /// Ignores SIGTERM, exits on its own right before SIGKILL lands.
    ExitsBeforeForceful,
    /// Signal delivery fails with an unexpected errno.
    Broken,
    /// Exits on SIGTERM and an unrelated, unkillable process takes its pid.
    PidReusedAfterGraceful,
}

#[derive(Debug)]
struct FakeProcess {
    pid: u32,
    name: String,
    behavior: Behavior,
    alive: bool,
    started: u64,
}

#[derive(Debug, Default)]
struct State {
    processes: Vec<FakeProcess>,
    extra: Vec<RawProcess>,
    enumeration_error: Option<String>,
    signals: Vec<(u32, SignalMode)>,
    clock: u64,
}

#[derive(Debug, Default)]
pub struct FakeAccessor {
    state: Mutex<State>,
}

impl FakeAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&self, pid: u32, name: &str) {
        self.spawn_with(pid, name, Behavior::Cooperative);
    }

    pub fn spawn_with(&self, pid: u32, name: &str, behavior: Behavior) {
        let mut state = self.state.lock();
        state.clock += 1;
        let started = state.clock;
        state.processes.push(FakeProcess {
            pid,
            name: name.to_string(),
            behavior,
            alive: true,
            started,
        });
    }

    /// Append an entry verbatim to every enumeration.
    pub fn push_raw(&self, entry: RawProcess) {
        self.state.lock().extra.push(entry);
    }

    pub fn fail_enumeration(&self, reason: &str) {
        self.state.lock().enumeration_error = Some(reason.to_string());
    }

    pub fn signals(&self) -> Vec<(u32, SignalMode)> {
        self.state.lock().signals.clone()
    }

    pub fn alive(&self, pid: u32) -> bool {
        self.state
            .lock()
            .processes
            .iter()
            .any(|p| p.pid == pid && p.alive)
    }
}

impl ProcessAccessor for FakeAccessor {
    fn enumerate(&self) -> Result<Vec<RawProcess>, ProcError> {
        let state = self.state.lock();
        if let Some(reason) = &state.enumeration_error {
            return Err(ProcError::AccessFailure(reason.clone()));
        }
        let mut out: Vec<RawProcess> = state
            .processes
            .iter()
            .filter(|p| p.alive)
            .map(|p| RawProcess::new(p.pid, p.name.clone(), RawState::Sleeping))
            .collect();
        out.extend(state.extra.iter().cloned());
        Ok(out)
    }

    fn signal(&self, pid: u32, mode: SignalMode) -> Result<(), ProcError> {
        let mut state = self.state.lock();
        state.signals.push((pid, mode));
        let process = state
            .processes
            .iter_mut()
            .find(|p| p.pid == pid && p.alive)
            .ok_or(ProcError::NotFound(pid))?;

        match (process.behavior, mode) {
            (Behavior::Foreign, _) => return Err(ProcError::PermissionDenied(pid)),
            (Behavior::Broken, _) => {
                return Err(ProcError::PlatformError(format!("EIO signalling {}", pid)))
            }
            (Behavior::ExitsBeforeForceful, SignalMode::Forceful) => {
                process.alive = false;
                return Err(ProcError::NotFound(pid));
            }
            (Behavior::PidReusedAfterGraceful, SignalMode::Graceful) => {
                process.alive = false;
                state.clock += 1;
                let started = state.clock;
                state.processes.push(FakeProcess {
                    pid,
                    name: "newcomer".to_string(),
                    behavior: Behavior::Immune,
                    alive: true,
                    started,
                });
            }
            (Behavior::Cooperative, _) | (Behavior::IgnoresGraceful, SignalMode::Forceful) => {
                process.alive = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn start_time(&self, pid: u32) -> Result<Option<u64>, ProcError> {
        self.state
            .lock()
            .processes
            .iter()
            .find(|p| p.pid == pid && p.alive)
            .map(|p| Some(p.started))
            .ok_or(ProcError::NotFound(pid))
    }
}
