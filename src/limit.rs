//! Sliding-window rate limiter.
//!
//! Tracks the timestamp of every granted request and counts only those
//! inside the trailing window, giving exact "N requests per rolling window"
//! semantics. Pruning is O(n) per call with n bounded by the configured
//! maximum, which is a small number (tens to low hundreds).
//!
//! All state lives behind one mutex that is never held across an await, so
//! one waiter sleeping does not starve other callers.

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Admission controller consulted before every outbound request.
///
/// `tokio::time::Instant` is used throughout so tests can drive the limiter
/// with a paused clock.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: NonZeroUsize,
    window: Duration,
    granted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter admitting at most `max_requests` per trailing `window`.
    pub fn new(max_requests: NonZeroUsize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            granted: Mutex::new(VecDeque::with_capacity(max_requests.get())),
        }
    }

    /// Non-blocking admission check.
    ///
    /// Records the current timestamp and returns `true` if fewer than
    /// `max_requests` grants fall inside the trailing window, otherwise
    /// returns `false` without recording anything.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut granted = self.lock();
        prune(&mut granted, now, self.window);
        if granted.len() < self.max_requests.get() {
            granted.push_back(now);
            true
        } else {
            false
        }
    }

    /// Block until a slot frees, then record the grant.
    ///
    /// On a full window this sleeps until the oldest grant exits the window
    /// and re-checks. Never fails; dropping the returned future cancels the
    /// wait cleanly.
    pub async fn acquire(&self) {
        loop {
            let delay = {
                let now = Instant::now();
                let mut granted = self.lock();
                prune(&mut granted, now, self.window);
                if granted.len() < self.max_requests.get() {
                    granted.push_back(now);
                    return;
                }
                match granted.front() {
                    Some(oldest) => (*oldest + self.window).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            };

            if delay.is_zero() {
                // The oldest grant has already expired; the next pass prunes
                // it and admits us, so retry once instead of sleeping.
                continue;
            }
            tokio::time::sleep(delay).await;
        }
    }

    /// Like [`RateLimiter::acquire`], but gives up after `timeout`.
    ///
    /// Returns [`Error::WaitTimeout`] promptly once the deadline passes; the
    /// timeout never records a grant.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.acquire())
            .await
            .map_err(|_| Error::WaitTimeout)
    }

    /// Number of grants currently inside the window.
    pub fn in_flight(&self) -> usize {
        let now = Instant::now();
        let mut granted = self.lock();
        prune(&mut granted, now, self.window);
        granted.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Instant>> {
        // A poisoned lock only means another caller panicked mid-push; the
        // deque is still well-formed, so keep going.
        self.granted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drop grants that have aged out of the window, oldest first.
fn prune(granted: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = granted.front() {
        if now.duration_since(*front) >= window {
            granted.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::assert_ok;
    use std::sync::Arc;

    fn limiter(max: usize, window: Duration) -> RateLimiter {
        RateLimiter::new(NonZeroUsize::new(max).unwrap(), window)
    }

    #[tokio::test]
    async fn admits_up_to_capacity_then_denies() {
        let limiter = limiter(5, Duration::from_secs(60));
        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.in_flight(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_instead_of_resetting_in_bulk() {
        let limiter = limiter(2, Duration::from_secs(10));
        assert!(limiter.try_acquire());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        // 10s after the first grant: only the first slot has freed.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn allow_succeeds_again_after_full_window() {
        let limiter = limiter(1, Duration::from_secs(30));
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_sleeps_until_a_slot_frees() {
        let limiter = limiter(1, Duration::from_secs(60));
        assert!(limiter.try_acquire());

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_timeout_returns_near_the_deadline() {
        let limiter = limiter(1, Duration::from_secs(60));
        assert!(limiter.try_acquire());

        let start = Instant::now();
        let result = limiter.acquire_timeout(Duration::from_secs(5)).await;
        assert!(matches!(result, Err(Error::WaitTimeout)));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn acquire_timeout_with_free_capacity_returns_immediately() {
        let limiter = limiter(3, Duration::from_secs(60));
        assert_ok!(limiter.acquire_timeout(Duration::from_secs(1)).await);
        assert_eq!(limiter.in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_wait_records_no_grant() {
        let limiter = limiter(1, Duration::from_secs(60));
        assert!(limiter.try_acquire());
        let _ = limiter.acquire_timeout(Duration::from_secs(1)).await;
        assert_eq!(limiter.in_flight(), 1);
    }

    #[tokio::test]
    async fn zero_width_window_never_blocks() {
        let limiter = limiter(1, Duration::ZERO);
        for _ in 0..100 {
            assert!(limiter.try_acquire());
        }
        limiter.acquire().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_admission_is_exact() {
        let limiter = Arc::new(limiter(100, Duration::from_secs(600)));
        let admitted = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(1000);
        for _ in 0..1000 {
            let limiter = Arc::clone(&limiter);
            let admitted = Arc::clone(&admitted);
            handles.push(tokio::spawn(async move {
                if limiter.try_acquire() {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 100);
        assert_eq!(limiter.in_flight(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_drain_at_window_pace() {
        let limiter = Arc::new(limiter(2, Duration::from_secs(10)));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());

        let start = Instant::now();
        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        futures::future::try_join_all(waiters).await.unwrap();

        // Both initial grants were recorded at t0, so both waiters get in
        // once the window has passed, not one window each.
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }
}
