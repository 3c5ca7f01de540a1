use std::time::Duration;

/// Exponential reconnect delay: starts at `floor`, doubles per consecutive
/// failure, never exceeds `ceiling`.
#[derive(Debug, Clone)]
pub struct Backoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            floor,
            ceiling,
            current: floor,
            failures: 0,
        }
    }

    /// Delay to wait after the failure just observed.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        self.failures = self.failures.saturating_add(1);
        delay
    }

    /// Called once a session is established.
    pub fn reset(&mut self) {
        self.current = self.floor;
        self.failures = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
