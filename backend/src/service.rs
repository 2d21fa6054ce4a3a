//! The query facade consumed by front-ends.

use crate::config::Config;
use crate::lifecycle::LifecycleController;
use crate::platform::{NativeAccessor, ProcessAccessor};
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::types::{ProcError, TerminationRequest, TerminationResult};
use once_cell::sync::Lazy;
use std::env;
use sysinfo::System;
use tracing::{info, warn};

static OS_DESCRIPTION: Lazy<String> =
    Lazy::new(|| System::long_os_version().unwrap_or_else(|| env::consts::OS.to_string()));

static DEFAULT_SERVICE: Lazy<ProcessService> = Lazy::new(ProcessService::native);

/// Stateless entry point for listing and terminating processes.
///
/// Every call reads live OS state; nothing is cached between calls except
/// the OS description.
pub struct ProcessService<A: ProcessAccessor = NativeAccessor> {
    accessor: A,
    config: Config,
}

impl ProcessService<NativeAccessor> {
    /// Native accessor with default configuration.
    pub fn native() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_accessor(NativeAccessor::default(), config)
    }
}

impl<A: ProcessAccessor> ProcessService<A> {
    pub fn with_accessor(accessor: A, config: Config) -> Self {
        Self { accessor, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Short platform name, e.g. `linux`, `macos`, `windows`.
    pub fn get_os_name(&self) -> &'static str {
        env::consts::OS
    }

    /// Human-readable OS name and version, e.g. `Linux (Ubuntu 24.04)`.
    pub fn os_description(&self) -> &'static str {
        OS_DESCRIPTION.as_str()
    }

    pub fn list_processes(&self) -> Result<Snapshot, ProcError> {
        SnapshotBuilder::new(&self.accessor).build()
    }

    /// Terminate `id` and report whether it is gone.
    ///
    /// Uses the configured default escalation. See [`Self::kill_detailed`]
    /// for the full outcome.
    pub fn kill_by_id(&self, id: u32) -> bool {
        let escalate = self.config.kill.escalate_by_default;
        let result = self.kill_detailed(id, escalate);
        if result.is_success() {
            info!(pid = id, "killed process");
        } else {
            warn!(pid = id, outcome = %result, "kill failed");
        }
        result.is_success()
    }

    pub fn kill_detailed(&self, id: u32, escalate: bool) -> TerminationResult {
        self.execute(&TerminationRequest { id, escalate })
    }

    pub fn execute(&self, request: &TerminationRequest) -> TerminationResult {
        LifecycleController::new(&self.accessor, &self.config.kill).execute(request)
    }
}

/// Short platform name of the running OS.
pub fn get_os_name() -> &'static str {
    DEFAULT_SERVICE.get_os_name()
}

/// Snapshot of live processes using the native accessor.
pub fn list_processes() -> Result<Snapshot, ProcError> {
    DEFAULT_SERVICE.list_processes()
}

/// Terminate a process with default settings.
pub fn kill_by_id(id: u32) -> bool {
    DEFAULT_SERVICE.kill_by_id(id)
}
