//! Single-shot readiness signal with escalating timers.
//!
//! A [`ReadinessGate`] is created for every start attempt and settles exactly
//! once, either `Ok(())` when the bridge reports it is ready or with the error
//! that ended the attempt. Later `complete` calls are ignored. Arming the gate
//! starts two timers: a "still starting" notice that leaves the gate pending,
//! and a deadline that settles it with [`BridgeError::ReadinessTimeout`]. Both
//! are cancelled the moment the gate settles.

use std::sync::Arc;
use std::time::Duration;

use probebridge_core::BridgeError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Delay before the "still starting" notice.
pub const DEFAULT_STILL_STARTING: Duration = Duration::from_secs(3);

/// Deadline for the bridge to report readiness.
pub const DEFAULT_READY_DEADLINE: Duration = Duration::from_secs(10);

type GateStatus = Option<Result<(), BridgeError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTimings {
    pub still_starting: Duration,
    pub deadline: Duration,
}

impl Default for GateTimings {
    fn default() -> Self {
        Self {
            still_starting: DEFAULT_STILL_STARTING,
            deadline: DEFAULT_READY_DEADLINE,
        }
    }
}

#[derive(Debug)]
struct GateInner {
    status: watch::Sender<GateStatus>,
    timers: CancellationToken,
}

/// Settle-once completion primitive for one start attempt.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    inner: Arc<GateInner>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (status, _) = watch::channel(None);
        Self {
            inner: Arc::new(GateInner {
                status,
                timers: CancellationToken::new(),
            }),
        }
    }

    /// A gate that is already settled.
    pub fn settled(outcome: Result<(), BridgeError>) -> Self {
        let gate = Self::new();
        gate.complete(outcome);
        gate
    }

    /// Settle the gate. Returns `false` if it was already settled.
    pub fn complete(&self, outcome: Result<(), BridgeError>) -> bool {
        let mut outcome = Some(outcome);
        let took_effect = self.inner.status.send_if_modified(|status| {
            if status.is_some() {
                return false;
            }
            *status = outcome.take();
            true
        });
        if took_effect {
            self.inner.timers.cancel();
        }
        took_effect
    }

    pub fn is_pending(&self) -> bool {
        self.inner.status.borrow().is_none()
    }

    /// The settled outcome, if any.
    pub fn outcome(&self) -> Option<Result<(), BridgeError>> {
        self.inner.status.borrow().clone()
    }

    pub fn waiter(&self) -> ReadinessWaiter {
        ReadinessWaiter {
            status: self.inner.status.subscribe(),
        }
    }

    /// Start the two readiness timers.
    ///
    /// `on_still_starting` runs once if the gate is still pending when the
    /// first timer fires. `on_timeout` runs once, after the gate has been
    /// settled with the timeout error.
    pub fn arm<S, T>(
        &self,
        timings: GateTimings,
        on_still_starting: S,
        on_timeout: T,
    ) -> JoinHandle<()>
    where
        S: FnOnce() + Send + 'static,
        T: FnOnce() + Send + 'static,
    {
        let gate = self.clone();
        let cancelled = self.inner.timers.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => return,
                () = tokio::time::sleep(timings.still_starting) => {}
            }
            if gate.is_pending() {
                on_still_starting();
            }

            let remaining = timings.deadline.saturating_sub(timings.still_starting);
            tokio::select! {
                () = cancelled.cancelled() => return,
                () = tokio::time::sleep(remaining) => {}
            }
            let secs = timings.deadline.as_secs();
            if gate.complete(Err(BridgeError::ReadinessTimeout { secs })) {
                debug!(secs = %secs, "Readiness deadline reached");
                on_timeout();
            }
        })
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Awaits the outcome of a [`ReadinessGate`].
#[derive(Debug, Clone)]
pub struct ReadinessWaiter {
    status: watch::Receiver<GateStatus>,
}

impl ReadinessWaiter {
    /// Wait until the gate settles.
    ///
    /// A gate dropped while still pending yields [`BridgeError::SupervisorGone`].
    pub async fn wait(mut self) -> Result<(), BridgeError> {
        match self.status.wait_for(Option::is_some).await {
            Ok(status) => (*status).clone().unwrap_or(Err(BridgeError::SupervisorGone)),
            Err(_) => Err(BridgeError::SupervisorGone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_pending, assert_ready_err, assert_ready_ok, task};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let hook = {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            }
        };
        (count, hook)
    }

    #[tokio::test]
    async fn settles_only_once() {
        let gate = ReadinessGate::new();
        assert!(gate.complete(Ok(())));
        assert!(!gate.complete(Err(BridgeError::StoppedByUser)));
        assert!(matches!(gate.outcome(), Some(Ok(()))));
        assert!(gate.waiter().wait().await.is_ok());
    }

    #[test]
    fn waiter_stays_pending_until_settled() {
        let gate = ReadinessGate::new();
        let mut wait = task::spawn(gate.waiter().wait());
        assert_pending!(wait.poll());

        gate.complete(Ok(()));
        assert!(wait.is_woken());
        assert_ready_ok!(wait.poll());
    }

    #[test]
    fn late_waiter_sees_settled_error_at_once() {
        let gate = ReadinessGate::settled(Err(BridgeError::StoppedByUser));
        let mut wait = task::spawn(gate.waiter().wait());
        let err = assert_ready_err!(wait.poll());
        assert!(matches!(err, BridgeError::StoppedByUser));
    }

    #[tokio::test]
    async fn waiters_see_error_outcome() {
        let gate = ReadinessGate::new();
        let first = gate.waiter();
        let second = gate.waiter();
        gate.complete(Err(BridgeError::EarlyExit("code 3".into())));
        assert!(matches!(first.wait().await, Err(BridgeError::EarlyExit(_))));
        assert!(matches!(second.wait().await, Err(BridgeError::EarlyExit(_))));
    }

    #[tokio::test]
    async fn dropped_pending_gate_reports_gone() {
        let gate = ReadinessGate::new();
        let waiter = gate.waiter();
        drop(gate);
        assert!(matches!(waiter.wait().await, Err(BridgeError::SupervisorGone)));
    }

    #[tokio::test(start_paused = true)]
    async fn timers_fire_at_three_and_ten_seconds() {
        let gate = ReadinessGate::new();
        let (slow, on_slow) = counter();
        let (timeouts, on_timeout) = counter();
        let timer = gate.arm(GateTimings::default(), on_slow, on_timeout);

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(slow.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(slow.load(Ordering::SeqCst), 1);
        assert!(gate.is_pending());

        tokio::time::sleep(Duration::from_millis(6_800)).await;
        assert_eq!(timeouts.load(Ordering::SeqCst), 0);
        assert!(gate.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
        assert!(matches!(
            gate.outcome(),
            Some(Err(BridgeError::ReadinessTimeout { secs: 10 }))
        ));

        timer.await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(slow.load(Ordering::SeqCst), 1);
        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn settling_cancels_timers() {
        let gate = ReadinessGate::new();
        let (slow, on_slow) = counter();
        let (timeouts, on_timeout) = counter();
        let timer = gate.arm(GateTimings::default(), on_slow, on_timeout);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(gate.complete(Ok(())));
        timer.await.unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(slow.load(Ordering::SeqCst), 0);
        assert_eq!(timeouts.load(Ordering::SeqCst), 0);
        assert!(matches!(gate.outcome(), Some(Ok(()))));
    }

    #[tokio::test(start_paused = true)]
    async fn settling_after_notice_skips_timeout() {
        let gate = ReadinessGate::new();
        let (slow, on_slow) = counter();
        let (timeouts, on_timeout) = counter();
        let _timer = gate.arm(GateTimings::default(), on_slow, on_timeout);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(slow.load(Ordering::SeqCst), 1);
        gate.complete(Err(BridgeError::StoppedByUser));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(timeouts.load(Ordering::SeqCst), 0);
        assert!(matches!(
            gate.waiter().wait().await,
            Err(BridgeError::StoppedByUser)
        ));
    }
}
