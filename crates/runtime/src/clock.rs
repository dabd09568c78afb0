use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic elapsed time since some fixed start.
pub trait TimeSource {
    fn elapsed(&self) -> Duration;

    fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

/// Wall clock started at construction.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

impl TimeSource for Clock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Clock advanced by hand. Clones share the same time, so a test can keep
/// one handle while the scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt: Duration) {
        self.nanos
            .fetch_add(dt.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Jump to an absolute time. Moving backwards is ignored.
    pub fn set(&self, t: Duration) {
        self.nanos
            .fetch_max(t.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl TimeSource for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_moves_forward() {
        let clock = Clock::start();
        let a = clock.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.elapsed() > a);
    }

    #[test]
    fn manual_clock_shares_time_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(1500));
        assert_eq!(clock.elapsed_secs(), 1.5);
    }

    #[test]
    fn manual_clock_is_monotonic() {
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(10));
        clock.set(Duration::from_secs(3));
        assert_eq!(clock.elapsed(), Duration::from_secs(10));
    }
}
