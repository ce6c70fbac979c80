// Session clocks. Gameplay time is whole milliseconds on an i64 timeline.

use std::cell::Cell;
use std::time::Instant;

pub trait TimeProvider {
    fn now_ms(&self) -> i64;
}

/// Wall clock. Reads 0 when created unless started at an offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeProvider {
    origin: Instant,
    offset_ms: i64,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Clock whose first reading is `offset_ms`, e.g. to line up with a
    /// music position the host already knows.
    pub fn starting_at(offset_ms: i64) -> Self {
        Self {
            origin: Instant::now(),
            offset_ms,
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.offset_ms.saturating_add(elapsed)
    }
}

/// Clock stepped by hand, one frame at a time.
#[derive(Debug, Default)]
pub struct MockTimeProvider {
    now: Cell<i64>,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(ms: i64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set_time(&self, ms: i64) {
        self.now.set(ms);
    }

    /// Step forward and return the new reading.
    pub fn advance(&self, delta_ms: i64) -> i64 {
        let next = self.now.get() + delta_ms;
        self.now.set(next);
        next
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

// lets a session borrow a clock the test keeps driving
impl<T: TimeProvider + ?Sized> TimeProvider for &T {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_stepping() {
        let clock = MockTimeProvider::at(100);
        assert_eq!(clock.advance(16), 116);
        assert_eq!(clock.advance(17), 133);
        assert_eq!(clock.now_ms(), 133);
        clock.set_time(-50);
        assert_eq!(clock.now_ms(), -50);
    }

    #[test]
    fn borrowed_clock_follows_owner() {
        let clock = MockTimeProvider::new();
        let borrowed = &clock;
        clock.set_time(42);
        assert_eq!(borrowed.now_ms(), 42);
    }

    #[test]
    fn wall_clock_offset() {
        let clock = SystemTimeProvider::starting_at(10_000);
        let first = clock.now_ms();
        assert!(first >= 10_000);
        assert!(clock.now_ms() >= first);
        assert!(SystemTimeProvider::new().now_ms() >= 0);
    }
}
