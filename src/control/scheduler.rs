//! Auto-play tick registration.

use std::time::Duration;

/// Single armed auto-play tick.
///
/// Arming replaces any earlier registration, so at most one tick is ever
/// pending. Times are offsets on the caller's monotonic clock.
#[derive(Debug, Default)]
pub struct AutoPlayScheduler {
    deadline: Option<Duration>,
}

impl AutoPlayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, at: Duration) {
        self.deadline = Some(at);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Consume the tick if it is due at `now`.
    pub fn take_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Clock offset from a millisecond timestamp such as `performance.now()`.
///
/// Negative and NaN inputs map to zero; values too large for a [`Duration`]
/// saturate to [`Duration::MAX`].
pub fn clock_from_millis(now_ms: f64) -> Duration {
    if now_ms.is_nan() || now_ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(now_ms / 1000.0).unwrap_or(Duration::MAX)
}
