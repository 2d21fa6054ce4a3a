//! Service configuration.

use crate::types::ProcError;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Termination policy applied by the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KillPolicy {
    /// How long a graceful signal gets before the target counts as ignoring it.
    pub grace_period_ms: u64,
    /// How long to wait for the OS to reclaim a forcefully signalled process.
    pub recheck_window_ms: u64,
    /// Liveness poll step inside the waits above.
    pub poll_interval_ms: u64,
    /// Escalation used by the simple `kill_by_id` entry point.
    pub escalate_by_default: bool,
    /// Whether a caller may terminate its own process.
    pub allow_self_termination: bool,
    /// Ids that are refused without signalling.
    pub protected_ids: Vec<u32>,
}

impl Default for KillPolicy {
    fn default() -> Self {
        Self {
            grace_period_ms: 500,
            recheck_window_ms: 300,
            poll_interval_ms: 20,
            escalate_by_default: true,
            allow_self_termination: true,
            protected_ids: vec![0, 1],
        }
    }
}

impl KillPolicy {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn recheck_window(&self) -> Duration {
        Duration::from_millis(self.recheck_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn is_protected(&self, id: u32) -> bool {
        self.protected_ids.contains(&id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub kill: KillPolicy,
}

impl Config {
    /// Defaults overlaid with `PROCCTL_*` environment variables.
    pub fn from_env() -> Result<Self, ProcError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProcError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let kill = &mut config.kill;

        if let Some(v) = lookup("PROCCTL_GRACE_MS") {
            kill.grace_period_ms = parse_u64("PROCCTL_GRACE_MS", &v)?;
        }
        if let Some(v) = lookup("PROCCTL_RECHECK_MS") {
            kill.recheck_window_ms = parse_u64("PROCCTL_RECHECK_MS", &v)?;
        }
        if let Some(v) = lookup("PROCCTL_POLL_MS") {
            kill.poll_interval_ms = parse_u64("PROCCTL_POLL_MS", &v)?;
        }
        if let Some(v) = lookup("PROCCTL_ESCALATE") {
            kill.escalate_by_default = parse_bool("PROCCTL_ESCALATE", &v)?;
        }
        if let Some(v) = lookup("PROCCTL_ALLOW_SELF_KILL") {
            kill.allow_self_termination = parse_bool("PROCCTL_ALLOW_SELF_KILL", &v)?;
        }
        if let Some(v) = lookup("PROCCTL_PROTECTED_IDS") {
            kill.protected_ids = parse_ids("PROCCTL_PROTECTED_IDS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProcError> {
        let kill = &self.kill;
        if kill.poll_interval_ms == 0 {
            return Err(ProcError::InvalidConfig(
                "poll interval must be at least 1ms".to_string(),
            ));
        }
        if kill.grace_period_ms < kill.poll_interval_ms
            || kill.recheck_window_ms < kill.poll_interval_ms
        {
            return Err(ProcError::InvalidConfig(format!(
                "wait windows ({}ms grace, {}ms recheck) must not be shorter than the {}ms poll interval",
                kill.grace_period_ms, kill.recheck_window_ms, kill.poll_interval_ms
            )));
        }
        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ProcError> {
    value
        .trim()
        .parse()
        .map_err(|_| ProcError::InvalidConfig(format!("{key}: expected milliseconds, got {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ProcError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ProcError::InvalidConfig(format!(
            "{key}: expected a boolean, got {value:?}"
        ))),
    }
}

fn parse_ids(key: &str, value: &str) -> Result<Vec<u32>, ProcError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| ProcError::InvalidConfig(format!("{key}: bad process id {s:?}")))
        })
        .collect()
}
