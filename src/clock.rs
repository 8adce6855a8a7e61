use std::time::Instant;

/// Monotonic millisecond time source read once per tick by the engine.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Clone, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to. Used by the simulator and tests.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now_ms: u64,
}

impl ManualClock {
    pub fn starting_at(now_ms: u64) -> Self {
        Self { now_ms }
    }

    pub fn advance(&mut self, dt_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
    }

    pub fn set(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_never_runs_backwards() {
        let mut clock = ManualClock::starting_at(1_000);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 1_250);
        clock.set(900);
        assert_eq!(clock.now_ms(), 1_250);
        clock.set(2_000);
        assert_eq!(clock.now_ms(), 2_000);
    }

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let first = clock.now_ms();
        let second = clock.now_ms();
        assert!(second >= first);
    }
}
