//! Blocking poll loops with optional timeout and cancellation
//!
//! Every wait in this crate (platform task resolution, guest tools
//! readiness) goes through [`poll_until`]. Waits are unbounded unless the
//! [`WaitPolicy`] carries a timeout; a [`CancelFlag`] lets another thread
//! stop a wait between probes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default poll interval (seconds) for platform tasks and guest tools.
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;

/// Shared cancellation flag.
///
/// Clones share the same flag; cancelling any clone cancels all waits
/// holding it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// How a wait polls and when it gives up.
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    /// Delay between probes
    pub interval: Duration,

    /// Maximum wall-clock time (None = wait forever)
    pub timeout: Option<Duration>,

    /// Cancellation flag checked before every probe
    pub cancel: Option<CancelFlag>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS))
    }
}

impl WaitPolicy {
    /// Poll at `interval` with no timeout and no cancellation.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
            cancel: None,
        }
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build a policy from configured seconds; `None` keeps the defaults.
    pub fn from_config(interval_seconds: Option<u64>, timeout_seconds: Option<u64>) -> Self {
        let interval = interval_seconds
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS));
        Self {
            interval,
            timeout: timeout_seconds.map(Duration::from_secs),
            cancel: None,
        }
    }

    /// Validate the policy.
    pub fn validate(&self) -> Result<(), WaitValidationError> {
        if self.interval.is_zero() {
            return Err(WaitValidationError::ZeroInterval);
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(WaitValidationError::ZeroTimeout);
            }
        }
        Ok(())
    }
}

/// Wait policy validation errors
#[derive(Debug, thiserror::Error)]
pub enum WaitValidationError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("timeout must be greater than zero when set")]
    ZeroTimeout,
}

/// Why a wait stopped before its condition held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaitInterrupted {
    #[error("wait timed out after {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("wait cancelled")]
    Cancelled,
}

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    /// Condition holds; stop with this value.
    Ready(T),
    /// Condition does not hold yet; keep polling.
    Pending,
}

/// Tracks elapsed time and cancellation for one wait.
#[derive(Debug)]
pub struct WaitClock<'a> {
    policy: &'a WaitPolicy,
    start: Instant,
}

impl<'a> WaitClock<'a> {
    /// Start the clock now.
    pub fn start(policy: &'a WaitPolicy) -> Self {
        Self {
            policy,
            start: Instant::now(),
        }
    }

    /// Check for cancellation or timeout.
    pub fn check(&self) -> Result<(), WaitInterrupted> {
        if self
            .policy
            .cancel
            .as_ref()
            .is_some_and(CancelFlag::is_cancelled)
        {
            return Err(WaitInterrupted::Cancelled);
        }

        let elapsed = self.start.elapsed();
        if let Some(timeout) = self.policy.timeout {
            if elapsed >= timeout {
                return Err(WaitInterrupted::TimedOut { elapsed });
            }
        }

        Ok(())
    }

    /// Time until the next probe, never past the deadline.
    pub fn next_delay(&self) -> Duration {
        match self.policy.timeout {
            Some(timeout) => {
                let remaining = timeout.saturating_sub(self.start.elapsed());
                self.policy.interval.min(remaining)
            }
            None => self.policy.interval,
        }
    }

    /// Get elapsed time since the wait started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Probe until it reports [`Poll::Ready`], sleeping `policy.interval`
/// between probes.
///
/// The probe runs at least once unless the wait is already cancelled.
/// Probe errors end the wait immediately; a probe that wants to keep
/// going after an error returns [`Poll::Pending`] itself.
pub fn poll_until<T, E, F>(policy: &WaitPolicy, mut probe: F) -> Result<T, E>
where
    E: From<WaitInterrupted>,
    F: FnMut() -> Result<Poll<T>, E>,
{
    let clock = WaitClock::start(policy);
    loop {
        clock.check()?;
        if let Poll::Ready(value) = probe()? {
            return Ok(value);
        }
        thread::sleep(clock.next_delay());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Interrupted(WaitInterrupted),
        Probe,
    }

    impl From<WaitInterrupted> for TestError {
        fn from(e: WaitInterrupted) -> Self {
            TestError::Interrupted(e)
        }
    }

    fn fast() -> WaitPolicy {
        WaitPolicy::unbounded(Duration::from_millis(1))
    }

    #[test]
    fn test_default_policy_is_unbounded() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert!(policy.timeout.is_none());
        assert!(policy.cancel.is_none());
    }

    #[test]
    fn test_from_config() {
        let policy = WaitPolicy::from_config(Some(2), Some(60));
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert_eq!(policy.timeout, Some(Duration::from_secs(60)));

        let defaults = WaitPolicy::from_config(None, None);
        assert_eq!(defaults.interval, Duration::from_secs(5));
        assert!(defaults.timeout.is_none());
    }

    #[test]
    fn test_validate() {
        assert!(fast().validate().is_ok());
        assert!(matches!(
            WaitPolicy::unbounded(Duration::ZERO).validate(),
            Err(WaitValidationError::ZeroInterval)
        ));
        assert!(matches!(
            fast().with_timeout(Duration::ZERO).validate(),
            Err(WaitValidationError::ZeroTimeout)
        ));
    }

    #[test]
    fn test_ready_after_pending_probes() {
        let mut calls = 0;
        let result: Result<u32, TestError> = poll_until(&fast(), || {
            calls += 1;
            Ok(if calls == 3 { Poll::Ready(calls) } else { Poll::Pending })
        });
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn test_probe_error_stops_wait() {
        let mut calls = 0;
        let result: Result<(), TestError> = poll_until(&fast(), || {
            calls += 1;
            Err(TestError::Probe)
        });
        assert_eq!(result, Err(TestError::Probe));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_timeout() {
        let policy = fast().with_timeout(Duration::from_millis(20));
        let result: Result<(), TestError> = poll_until(&policy, || Ok(Poll::Pending));
        assert!(matches!(
            result,
            Err(TestError::Interrupted(WaitInterrupted::TimedOut { .. }))
        ));
    }

    #[test]
    fn test_cancel_before_first_probe() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let policy = fast().with_cancel(cancel);
        let mut calls = 0;
        let result: Result<(), TestError> = poll_until(&policy, || {
            calls += 1;
            Ok(Poll::Pending)
        });
        assert_eq!(
            result,
            Err(TestError::Interrupted(WaitInterrupted::Cancelled))
        );
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_cancel_from_probe() {
        let cancel = CancelFlag::new();
        let policy = fast().with_cancel(cancel.clone());
        let mut calls = 0;
        let result: Result<(), TestError> = poll_until(&policy, || {
            calls += 1;
            if calls == 2 {
                cancel.cancel();
            }
            Ok(Poll::Pending)
        });
        assert_eq!(
            result,
            Err(TestError::Interrupted(WaitInterrupted::Cancelled))
        );
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_next_delay_capped_by_deadline() {
        let policy = WaitPolicy::unbounded(Duration::from_secs(5))
            .with_timeout(Duration::from_millis(50));
        let clock = WaitClock::start(&policy);
        assert!(clock.next_delay() <= Duration::from_millis(50));
    }
}
