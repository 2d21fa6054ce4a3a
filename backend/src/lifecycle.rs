//! Process termination with graceful-then-forceful escalation.

use crate::config::KillPolicy;
use crate::platform::ProcessAccessor;
use crate::types::{ProcError, SignalMode, TerminationRequest, TerminationResult};
use std::time::{Duration, Instant};
use std::{process, thread};
use tracing::{debug, info, warn};

pub struct LifecycleController<'a, A: ProcessAccessor + ?Sized> {
    accessor: &'a A,
    policy: &'a KillPolicy,
}

impl<'a, A: ProcessAccessor + ?Sized> LifecycleController<'a, A> {
    pub fn new(accessor: &'a A, policy: &'a KillPolicy) -> Self {
        Self { accessor, policy }
    }

    pub fn execute(&self, request: &TerminationRequest) -> TerminationResult {
        self.kill(request.id, request.escalate)
    }

    /// Terminate `id`.
    ///
    /// Sends a graceful signal and waits up to the grace period. With
    /// `escalate`, a survivor then gets a forceful signal and one more bounded
    /// wait. Signal failures are reported as-is; nothing is retried beyond
    /// that single escalation.
    ///
    /// The target's start time is captured up front. If the id is later held
    /// by a process with a different start time, the original has exited and
    /// the newcomer is left alone.
    pub fn kill(&self, id: u32, escalate: bool) -> TerminationResult {
        if let Some(reason) = self.refusal(id) {
            warn!(pid = id, reason, "refusing to terminate");
            return TerminationResult::PermissionDenied;
        }

        // The signal below classifies a missing or foreign target.
        let identity = self.accessor.start_time(id).unwrap_or_else(|e| {
            debug!(pid = id, error = %e, "start time unavailable");
            None
        });

        if let Err(e) = self.accessor.signal(id, SignalMode::Graceful) {
            debug!(pid = id, error = %e, "graceful signal failed");
            return e.into();
        }

        if self.wait_for_exit(id, identity, self.policy.grace_period()) {
            info!(pid = id, "process exited after graceful signal");
            return TerminationResult::Terminated;
        }
        if !escalate {
            warn!(pid = id, "process ignored graceful signal");
            return TerminationResult::StillRunning;
        }

        if self.replaced(id, identity) {
            info!(pid = id, "pid taken by another process, not escalating");
            return TerminationResult::Terminated;
        }
        match self.accessor.signal(id, SignalMode::Forceful) {
            Ok(()) => {}
            // Exited on its own between the last probe and SIGKILL.
            Err(ProcError::NotFound(_)) => return TerminationResult::Terminated,
            Err(e) => {
                debug!(pid = id, error = %e, "forceful signal failed");
                return e.into();
            }
        }

        if self.wait_for_exit(id, identity, self.policy.recheck_window()) {
            info!(pid = id, "process exited after forceful signal");
            TerminationResult::Terminated
        } else {
            warn!(pid = id, "process survived forceful signal");
            TerminationResult::StillRunning
        }
    }

    fn refusal(&self, id: u32) -> Option<&'static str> {
        if self.policy.is_protected(id) {
            Some("protected process")
        } else if !self.policy.allow_self_termination && id == process::id() {
            Some("self-termination disabled")
        } else {
            None
        }
    }

    /// Whether `id` now belongs to a different process than the one recorded.
    fn replaced(&self, id: u32, identity: Option<u64>) -> bool {
        let Some(started) = identity else {
            return false;
        };
        match self.accessor.start_time(id) {
            Ok(Some(now)) => now != started,
            Ok(None) => false,
            Err(ProcError::NotFound(_)) => true,
            Err(_) => false,
        }
    }

    /// Poll liveness until `id` is gone or `window` elapses.
    fn wait_for_exit(&self, id: u32, identity: Option<u64>, window: Duration) -> bool {
        let deadline = Instant::now() + window;
        let step = self.policy.poll_interval();
        loop {
            match self.accessor.is_running(id) {
                Ok(false) | Err(ProcError::NotFound(_)) => return true,
                Ok(true) if self.replaced(id, identity) => return true,
                Ok(true) => {}
                Err(e) => debug!(pid = id, error = %e, "liveness probe failed"),
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(step.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, FakeAccessor};

    fn fast_policy() -> KillPolicy {
        KillPolicy {
            grace_period_ms: 30,
            recheck_window_ms: 30,
            poll_interval_ms: 5,
            ..KillPolicy::default()
        }
    }

    #[test]
    fn cooperative_process_terminates_on_graceful_signal() {
        let fake = FakeAccessor::new();
        fake.spawn(4821, "sleep");
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy).kill(4821, false);
        assert_eq!(result, TerminationResult::Terminated);
        assert_eq!(fake.signals(), vec![(4821, SignalMode::Graceful)]);
    }

    #[test]
    fn missing_process_is_not_found() {
        let fake = FakeAccessor::new();
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy).kill(999, true);
        assert_eq!(result, TerminationResult::NotFound);
    }

    #[test]
    fn foreign_process_is_permission_denied() {
        let fake = FakeAccessor::new();
        fake.spawn_with(500, "sshd", Behavior::Foreign);
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy).kill(500, true);
        assert_eq!(result, TerminationResult::PermissionDenied);
        assert!(fake.alive(500));
    }

    #[test]
    fn ignored_graceful_without_escalation_is_still_running() {
        let fake = FakeAccessor::new();
        fake.spawn_with(42, "stubborn", Behavior::IgnoresGraceful);
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy).kill(42, false);
        assert_eq!(result, TerminationResult::StillRunning);
        assert_eq!(fake.signals(), vec![(42, SignalMode::Graceful)]);
    }

    #[test]
    fn escalation_sends_forceful_signal() {
        let fake = FakeAccessor::new();
        fake.spawn_with(42, "stubborn", Behavior::IgnoresGraceful);
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy)
            .execute(&TerminationRequest::escalating(42));
        assert_eq!(result, TerminationResult::Terminated);
        assert_eq!(
            fake.signals(),
            vec![(42, SignalMode::Graceful), (42, SignalMode::Forceful)]
        );
    }

    #[test]
    fn immune_process_reports_still_running_after_escalation() {
        let fake = FakeAccessor::new();
        fake.spawn_with(4, "kworker", Behavior::Immune);
        let policy = fast_policy();
        let started = Instant::now();
        let result = LifecycleController::new(&fake, &policy).kill(4, true);
        assert_eq!(result, TerminationResult::StillRunning);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn exit_right_before_forceful_counts_as_terminated() {
        let fake = FakeAccessor::new();
        fake.spawn_with(77, "racer", Behavior::ExitsBeforeForceful);
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy).kill(77, true);
        assert_eq!(result, TerminationResult::Terminated);
    }

    #[test]
    fn reused_pid_is_not_escalated_against() {
        let fake = FakeAccessor::new();
        fake.spawn_with(88, "original", Behavior::PidReusedAfterGraceful);
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy).kill(88, true);
        assert_eq!(result, TerminationResult::Terminated);
        assert_eq!(fake.signals(), vec![(88, SignalMode::Graceful)]);
        assert!(fake.alive(88));
    }

    #[test]
    fn platform_errors_carry_detail() {
        let fake = FakeAccessor::new();
        fake.spawn_with(13, "odd", Behavior::Broken);
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy).kill(13, true);
        assert_eq!(
            result,
            TerminationResult::Error("Platform error: EIO signalling 13".to_string())
        );
    }

    #[test]
    fn protected_ids_are_refused_without_signalling() {
        let fake = FakeAccessor::new();
        fake.spawn(1, "init");
        let policy = fast_policy();
        let result = LifecycleController::new(&fake, &policy).kill(1, true);
        assert_eq!(result, TerminationResult::PermissionDenied);
        assert!(fake.signals().is_empty());
        assert!(fake.alive(1));
    }

    #[test]
    fn self_termination_follows_policy() {
        let me = process::id();
        let fake = FakeAccessor::new();
        fake.spawn(me, "self");

        let forbid = KillPolicy {
            allow_self_termination: false,
            ..fast_policy()
        };
        let result = LifecycleController::new(&fake, &forbid).kill(me, false);
        assert_eq!(result, TerminationResult::PermissionDenied);
        assert!(fake.signals().is_empty());

        // The fake only pretends to die.
        let allow = fast_policy();
        let result = LifecycleController::new(&fake, &allow).kill(me, false);
        assert_eq!(result, TerminationResult::Terminated);
    }
}
