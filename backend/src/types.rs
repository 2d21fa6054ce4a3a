//! Data types and error definitions for process management.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One process observed at snapshot time.
///
/// Records are point-in-time facts: a later snapshot produces new records
/// rather than updating these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessRecord {
    id: u32,
    name: String,
}

impl ProcessRecord {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Platform process identifier. Only unique within one snapshot.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Scheduler state as reported by the platform, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawState {
    Running,
    Sleeping,
    Stopped,
    Zombie,
    Dead,
    Other(char),
    Unknown,
}

impl RawState {
    /// Map a `/proc/<pid>/stat` state letter.
    pub fn from_stat_char(c: char) -> Self {
        match c {
            'R' => RawState::Running,
            'S' | 'D' | 'I' => RawState::Sleeping,
            'T' | 't' => RawState::Stopped,
            'Z' => RawState::Zombie,
            'X' | 'x' => RawState::Dead,
            other => RawState::Other(other),
        }
    }

    /// Whether the process has exited and is only waiting to be reaped.
    pub fn is_exited(self) -> bool {
        matches!(self, RawState::Zombie | RawState::Dead)
    }
}

/// An entry as the platform accessor reports it.
///
/// `name == None` marks an entry that vanished while the table was being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProcess {
    pub pid: u32,
    pub name: Option<String>,
    pub state: RawState,
}

impl RawProcess {
    pub fn new(pid: u32, name: impl Into<String>, state: RawState) -> Self {
        Self {
            pid,
            name: Some(name.into()),
            state,
        }
    }

    pub fn vanished(pid: u32) -> Self {
        Self {
            pid,
            name: None,
            state: RawState::Unknown,
        }
    }
}

/// How a termination signal should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMode {
    /// Cooperative shutdown request the target may ignore.
    Graceful,
    /// OS-enforced termination the target cannot refuse.
    Forceful,
}

impl fmt::Display for SignalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalMode::Graceful => f.write_str("graceful"),
            SignalMode::Forceful => f.write_str("forceful"),
        }
    }
}

/// A request to terminate one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminationRequest {
    pub id: u32,
    /// Follow up with a forceful signal if the graceful one is ignored.
    #[serde(default)]
    pub escalate: bool,
}

impl TerminationRequest {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            escalate: false,
        }
    }

    pub fn escalating(id: u32) -> Self {
        Self { id, escalate: true }
    }
}

/// Outcome of a termination attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum TerminationResult {
    Terminated,
    NotFound,
    PermissionDenied,
    StillRunning,
    Error(String),
}

impl TerminationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TerminationResult::Terminated)
    }
}

impl fmt::Display for TerminationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationResult::Terminated => f.write_str("terminated"),
            TerminationResult::NotFound => f.write_str("not found"),
            TerminationResult::PermissionDenied => f.write_str("permission denied"),
            TerminationResult::StillRunning => f.write_str("still running"),
            TerminationResult::Error(detail) => write!(f, "error: {}", detail),
        }
    }
}

impl From<ProcError> for TerminationResult {
    fn from(err: ProcError) -> Self {
        match err {
            ProcError::NotFound(_) => TerminationResult::NotFound,
            ProcError::PermissionDenied(_) => TerminationResult::PermissionDenied,
            ProcError::StillRunning(_) => TerminationResult::StillRunning,
            other => TerminationResult::Error(other.to_string()),
        }
    }
}

/// Errors that can occur during process management.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcError {
    #[error("Process table unavailable: {0}")]
    AccessFailure(String),
    #[error("Process {0} not found")]
    NotFound(u32),
    #[error("Permission denied for PID {0}")]
    PermissionDenied(u32),
    #[error("Process {0} survived termination")]
    StillRunning(u32),
    #[error("Platform error: {0}")]
    PlatformError(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(target_os = "linux")]
impl From<procfs::ProcError> for ProcError {
    fn from(err: procfs::ProcError) -> Self {
        match err {
            procfs::ProcError::PermissionDenied(path) => ProcError::AccessFailure(format!(
                "permission denied reading {}",
                path.map(|p| p.display().to_string())
                    .unwrap_or_else(|| "/proc".to_string())
            )),
            other => ProcError::PlatformError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_chars_map_to_states() {
        assert_eq!(RawState::from_stat_char('R'), RawState::Running);
        assert_eq!(RawState::from_stat_char('D'), RawState::Sleeping);
        assert_eq!(RawState::from_stat_char('Z'), RawState::Zombie);
        assert_eq!(RawState::from_stat_char('W'), RawState::Other('W'));
        assert!(RawState::Zombie.is_exited());
        assert!(!RawState::Stopped.is_exited());
    }

    #[test]
    fn only_terminated_counts_as_success() {
        assert!(TerminationResult::Terminated.is_success());
        assert!(!TerminationResult::NotFound.is_success());
        assert!(!TerminationResult::StillRunning.is_success());
        assert!(!TerminationResult::Error("boom".into()).is_success());
    }

    #[test]
    fn errors_fold_into_results() {
        assert_eq!(
            TerminationResult::from(ProcError::NotFound(7)),
            TerminationResult::NotFound
        );
        assert_eq!(
            TerminationResult::from(ProcError::PermissionDenied(1)),
            TerminationResult::PermissionDenied
        );
        assert_eq!(
            TerminationResult::from(ProcError::PlatformError("EIO".into())),
            TerminationResult::Error("Platform error: EIO".into())
        );
    }

    #[test]
    fn result_serializes_with_outcome_tag() {
        let json = serde_json::to_string(&TerminationResult::Terminated).unwrap();
        assert_eq!(json, r#"{"outcome":"terminated"}"#);
        let json = serde_json::to_string(&TerminationResult::Error("x".into())).unwrap();
        assert_eq!(json, r#"{"outcome":"error","detail":"x"}"#);
    }

    #[test]
    fn record_serializes_as_id_and_name() {
        let json = serde_json::to_string(&ProcessRecord::new(4821, "sleep")).unwrap();
        assert_eq!(json, r#"{"id":4821,"name":"sleep"}"#);
    }
}
