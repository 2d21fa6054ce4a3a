//! UI-agnostic process inventory and termination library.
//!
//! Provides point-in-time process listing and one-shot termination with
//! optional graceful-to-forceful escalation. Linux reads `/proc` through
//! `procfs`; other platforms go through `sysinfo`. Signals use `nix` on Unix.

pub mod config;
pub mod lifecycle;
pub mod platform;
pub mod service;
pub mod snapshot;
mod types;

#[cfg(test)]
mod testing;

pub use config::{Config, KillPolicy};
pub use lifecycle::LifecycleController;
pub use platform::{NativeAccessor, ProcessAccessor, SysinfoAccessor};
pub use service::{get_os_name, kill_by_id, list_processes, ProcessService};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use types::{
    ProcError, ProcessRecord, RawProcess, RawState, SignalMode, TerminationRequest,
    TerminationResult,
};

#[cfg(target_os = "linux")]
pub use platform::ProcfsAccessor;
