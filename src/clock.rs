//! Time abstraction for report timestamps and retry delays.
//!
//! Retry backoff blocks the calling thread. Routing it through [`Clock`]
//! lets tests observe the delays without actually waiting.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Source of wall time and blocking delays.
pub trait Clock: Send + Sync {
    /// Get the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Block the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// System clock using actual wall time and `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Mock clock that records sleeps instead of blocking.
///
/// Each recorded sleep advances the mock time by the same amount.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug)]
pub struct MockClock {
    state: std::sync::Mutex<MockState>,
}

#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug)]
struct MockState {
    now: DateTime<Utc>,
    sleeps: Vec<Duration>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Create a mock clock frozen at the given time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: std::sync::Mutex::new(MockState {
                now,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Create a mock clock from an RFC 3339 string.
    pub fn from_rfc3339(s: &str) -> Self {
        Self::new(
            DateTime::parse_from_rfc3339(s)
                .expect("valid RFC 3339")
                .with_timezone(&Utc),
        )
    }

    /// Every delay passed to [`Clock::sleep`] so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.sleeps.push(duration);
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        state.now = state.now + step;
    }
}
