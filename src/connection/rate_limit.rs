//! Per-connection sliding-window rate limiter: a window-reset-on-elapse
//! counter scoped to a single connection's inbound frame rate.

use std::time::{Duration, Instant};

/// Tracks inbound frames for one connection within the current window.
/// Not `Clone`/`Send` shared state on its own — callers hold it behind
/// whatever synchronization wraps the owning connection entry.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    window_start: Instant,
    count: u32,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            count: 0,
        }
    }

    /// Records one inbound frame at `now`. Returns `true` if it is within
    /// the allowed rate, `false` if this frame must be dropped.
    pub fn check_and_record(&mut self, now: Instant, window: Duration, max: u32) -> bool {
        if now.duration_since(self.window_start) >= window {
            self.window_start = now;
            self.count = 0;
        }

        if self.count >= max {
            return false;
        }

        self.count += 1;
        true
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_within_window() {
        let mut limiter = SlidingWindowLimiter::new();
        let now = Instant::now();
        let window = Duration::from_secs(1);

        for _ in 0..10 {
            assert!(limiter.check_and_record(now, window, 10));
        }
        assert!(!limiter.check_and_record(now, window, 10));
    }

    #[test]
    fn resets_after_window_elapses() {
        let mut limiter = SlidingWindowLimiter::new();
        let window = Duration::from_millis(100);
        let start = Instant::now();

        for _ in 0..10 {
            assert!(limiter.check_and_record(start, window, 10));
        }
        assert!(!limiter.check_and_record(start, window, 10));

        let later = start + Duration::from_millis(150);
        assert!(limiter.check_and_record(later, window, 10));
    }
}
