use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time, measured from an arbitrary origin.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time. Clones share the same clock, so a test or headless
/// driver can keep one handle and give the other to the render loop.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<Duration>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Timestamp of the last completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameClock {
    last: Duration,
}

impl FrameClock {
    pub fn new(start: Duration) -> Self {
        Self { last: start }
    }

    pub fn last(&self) -> Duration {
        self.last
    }

    /// Time since the last frame. Never negative.
    pub fn delta(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last)
    }

    /// Store `now` as the last frame time. The stored value never decreases.
    pub fn record(&mut self, now: Duration) {
        self.last = self.last.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_time_clones_share_state() {
        let a = ManualTime::new();
        let b = a.clone();
        a.advance(Duration::from_millis(16));
        assert_eq!(b.now(), Duration::from_millis(16));
    }

    #[test]
    fn delta_is_never_negative() {
        let clock = FrameClock::new(Duration::from_millis(100));
        assert_eq!(clock.delta(Duration::from_millis(40)), Duration::ZERO);
        assert_eq!(clock.delta(Duration::from_millis(116)), Duration::from_millis(16));
    }

    #[test]
    fn record_never_moves_backwards() {
        let mut clock = FrameClock::new(Duration::from_millis(50));
        clock.record(Duration::from_millis(30));
        assert_eq!(clock.last(), Duration::from_millis(50));
        clock.record(Duration::from_millis(50));
        assert_eq!(clock.last(), Duration::from_millis(50));
        clock.record(Duration::from_millis(70));
        assert_eq!(clock.last(), Duration::from_millis(70));
    }

    #[test]
    fn monotonic_time_advances() {
        let t = MonotonicTime::new();
        let a = t.now();
        let b = t.now();
        assert!(b >= a);
    }
}
