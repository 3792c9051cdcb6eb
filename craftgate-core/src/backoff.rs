//! Reconnect delay policy.

use std::time::Duration;

/// Exponential backoff with a hard cap.
///
/// Deterministic: repeated failures yield a non-decreasing sequence of
/// delays up to `cap`, and `reset` returns the schedule to `base`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
    factor: f64,
    current: Duration,
}

impl ExponentialBackoff {
    /// A factor below 1.0 is clamped — the schedule never shrinks on
    /// its own.
    pub fn new(base: Duration, cap: Duration, factor: f64) -> Self {
        Self {
            base,
            cap: cap.max(base),
            factor: factor.max(1.0),
            current: base,
        }
    }

    /// The delay to wait before the next attempt; advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let next_ms = (self.current.as_millis() as f64 * self.factor) as u64;
        self.current = Duration::from_millis(next_ms).min(self.cap);
        delay
    }

    /// The delay the next `next_delay` call would return, without
    /// advancing.
    pub fn current_delay(&self) -> Duration {
        self.current
    }

    /// Return the schedule to its base delay.
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff() -> ExponentialBackoff {
        ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30), 2.0)
    }

    #[test]
    fn delays_are_non_decreasing_and_capped() {
        let mut b = backoff();
        let mut previous = Duration::ZERO;
        for _ in 0..10 {
            let delay = b.next_delay();
            assert!(delay >= previous);
            assert!(delay <= Duration::from_secs(30));
            previous = delay;
        }
        assert_eq!(previous, Duration::from_secs(30));
    }

    #[test]
    fn doubles_from_base() {
        let mut b = backoff();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert_eq!(b.next_delay(), Duration::from_secs(2));
        assert_eq!(b.next_delay(), Duration::from_secs(4));
    }

    #[test]
    fn reset_returns_to_base() {
        let mut b = backoff();
        for _ in 0..6 {
            b.next_delay();
        }
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn factor_below_one_is_clamped() {
        let mut b = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30), 0.5);
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert!(b.next_delay() >= Duration::from_secs(1));
    }

    #[test]
    fn cap_below_base_is_raised_to_base() {
        let mut b = ExponentialBackoff::new(Duration::from_secs(5), Duration::from_secs(1), 2.0);
        assert_eq!(b.next_delay(), Duration::from_secs(5));
        assert_eq!(b.next_delay(), Duration::from_secs(5));
    }
}
