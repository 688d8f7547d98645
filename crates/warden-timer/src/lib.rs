//! One-shot refresh timers for Warden.
//!
//! A session holds at most one pending refresh: a task that wakes up a
//! few minutes before the token expires and re-verifies it. This crate
//! provides that task as an owned, cancelable handle ([`RefreshTimer`])
//! plus the arithmetic for when it should fire ([`refresh_delay`]).
//!
//! # Ownership
//!
//! The timer is a value. Whoever holds it decides its fate:
//!
//! ```text
//! arm() ──→ RefreshTimer ──┬── cancel() / drop ──→ task aborted
//!                          └── disarm()         ──→ handle released, task keeps running
//! ```
//!
//! Replacing an `Option<RefreshTimer>` with a new timer drops (and so
//! aborts) the old one, which is how "at most one timer" is kept.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Clock helpers
// ---------------------------------------------------------------------------

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Token expiries are absolute wall-clock instants (they survive a
/// process restart), so this uses `SystemTime`, not a monotonic clock.
/// A clock set before 1970 reads as 0.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// How long to wait before refreshing a token that expires at
/// `expires_at_ms`, refreshing `lead` ahead of expiry.
///
/// Returns `None` when the refresh point is now or already past, i.e.
/// the token is inside the refresh window or expired. Callers should
/// then re-verify on next use instead of arming a timer.
///
/// ```rust
/// use std::time::Duration;
/// use warden_timer::refresh_delay;
///
/// let five_min = Duration::from_secs(300);
/// assert_eq!(
///     refresh_delay(1_000_000, 0, five_min),
///     Some(Duration::from_millis(700_000)),
/// );
/// assert_eq!(refresh_delay(240_000, 0, five_min), None);
/// ```
pub fn refresh_delay(
    expires_at_ms: u64,
    now_ms: u64,
    lead: Duration,
) -> Option<Duration> {
    let lead_ms = u64::try_from(lead.as_millis()).unwrap_or(u64::MAX);
    let fire_at = expires_at_ms.saturating_sub(lead_ms);
    (fire_at > now_ms && expires_at_ms > lead_ms)
        .then(|| Duration::from_millis(fire_at - now_ms))
}

// ---------------------------------------------------------------------------
// RefreshTimer
// ---------------------------------------------------------------------------

/// A pending one-shot task on the Tokio runtime.
///
/// Dropping the handle aborts the task if it hasn't run yet, so a timer
/// can never outlive the state that owns it by accident.
#[derive(Debug)]
pub struct RefreshTimer {
    /// `None` only after `disarm`, which consumes `self`; kept as an
    /// `Option` so `Drop` can tell the two exits apart.
    handle: Option<JoinHandle<()>>,
    deadline: TokioInstant,
}

impl RefreshTimer {
    /// Spawns `task` to run after `delay`.
    ///
    /// Returns `None` when called outside a Tokio runtime; there is
    /// nothing to schedule on, and the caller falls back to verifying
    /// on next use.
    pub fn arm<F>(delay: Duration, task: F) -> Option<Self>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no tokio runtime; refresh timer not armed");
            return None;
        };

        let deadline = TokioInstant::now() + delay;
        let handle = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            trace!("refresh timer fired");
            task.await;
        });

        debug!(delay_ms = delay.as_millis() as u64, "refresh timer armed");
        Some(Self {
            handle: Some(handle),
            deadline,
        })
    }

    /// Aborts the task if it hasn't finished.
    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!("refresh timer cancelled");
            }
            handle.abort();
        }
    }

    /// Releases the handle without aborting the task.
    ///
    /// The firing task calls this on its own handle before doing any
    /// work that might replace or cancel the timer, so it doesn't abort
    /// itself halfway through.
    pub fn disarm(mut self) {
        self.handle.take();
    }

    /// Time left until the task fires; zero once the deadline has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(TokioInstant::now())
    }

    /// `true` once the task has run to completion or been aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MIN: Duration = Duration::from_secs(300);

    #[test]
    fn test_refresh_delay_far_future_subtracts_lead() {
        let now = 10_000;
        let expires = now + 3_600_000;
        assert_eq!(
            refresh_delay(expires, now, FIVE_MIN),
            Some(Duration::from_millis(3_600_000 - 300_000))
        );
    }

    #[test]
    fn test_refresh_delay_inside_window_is_none() {
        let now = 1_000_000;
        assert_eq!(refresh_delay(now + 240_000, now, FIVE_MIN), None);
    }

    #[test]
    fn test_refresh_delay_exactly_at_window_edge_is_none() {
        let now = 1_000_000;
        assert_eq!(refresh_delay(now + 300_000, now, FIVE_MIN), None);
    }

    #[test]
    fn test_refresh_delay_expired_is_none() {
        assert_eq!(refresh_delay(5, 1_000_000, FIVE_MIN), None);
    }

    #[test]
    fn test_refresh_delay_zero_lead() {
        assert_eq!(
            refresh_delay(2_000, 1_000, Duration::ZERO),
            Some(Duration::from_millis(1_000))
        );
    }

    #[test]
    fn test_refresh_delay_huge_lead_does_not_overflow() {
        assert_eq!(refresh_delay(u64::MAX, 0, Duration::MAX), None);
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_arm_outside_runtime_returns_none() {
        let timer = RefreshTimer::arm(Duration::from_secs(1), async {});
        assert!(timer.is_none());
    }
}
