// scheduler.rs — animation-frame scheduling with an injectable clock

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(by, Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        let at = u64::try_from(at.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.store(at, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// 0 for the first tick after `start()`.
    pub index: u64,
    pub at: Duration,
    /// Time since the previous tick (zero for the first one).
    pub delta: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SchedulerState {
    Stopped,
    Running { next_index: u64, last: Option<Duration> },
}

/// The per-frame callback chain driving auto-rotation.
///
/// The host calls `tick()` once per animation frame; it only yields a `Tick`
/// while running. `stop()` breaks the chain: no tick fires until the next
/// `start()`.
pub struct FrameScheduler {
    clock: Arc<dyn Clock>,
    state: SchedulerState,
    fired: u64,
}

impl FrameScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: SchedulerState::Stopped,
            fired: 0,
        }
    }

    /// Starts the chain. Already running → no-op.
    pub fn start(&mut self) {
        if let SchedulerState::Stopped = self.state {
            self.state = SchedulerState::Running {
                next_index: 0,
                last: None,
            };
        }
    }

    pub fn stop(&mut self) {
        self.state = SchedulerState::Stopped;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// Total ticks fired over the scheduler's lifetime.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn tick(&mut self) -> Option<Tick> {
        let SchedulerState::Running { next_index, last } = self.state else {
            return None;
        };
        let at = self.clock.now();
        let delta = last.map(|l| at.saturating_sub(l)).unwrap_or_default();
        self.state = SchedulerState::Running {
            next_index: next_index + 1,
            last: Some(at),
        };
        self.fired += 1;
        Some(Tick {
            index: next_index,
            at,
            delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_only_while_running() {
        let clock = ManualClock::new();
        let mut s = FrameScheduler::new(Arc::new(clock.clone()));
        assert!(s.tick().is_none());

        s.start();
        let t0 = s.tick().unwrap();
        assert_eq!(t0.index, 0);
        assert_eq!(t0.delta, Duration::ZERO);

        clock.advance(Duration::from_millis(16));
        let t1 = s.tick().unwrap();
        assert_eq!(t1.index, 1);
        assert_eq!(t1.delta, Duration::from_millis(16));
        assert_eq!(t1.at, Duration::from_millis(16));

        s.stop();
        for _ in 0..10 {
            assert!(s.tick().is_none());
        }
        assert_eq!(s.fired(), 2);
    }

    #[test]
    fn restart_begins_a_new_chain() {
        let clock = ManualClock::new();
        let mut s = FrameScheduler::new(Arc::new(clock.clone()));
        s.start();
        s.tick();
        s.tick();
        s.start(); // no-op while running
        assert_eq!(s.tick().unwrap().index, 2);

        s.stop();
        s.start();
        assert_eq!(s.tick().unwrap().index, 0);
        assert_eq!(s.fired(), 4);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(Duration::from_secs(2));
        assert_eq!(b.now(), Duration::from_secs(2));
        b.set(Duration::from_millis(5));
        assert_eq!(a.now(), Duration::from_millis(5));
    }
}
