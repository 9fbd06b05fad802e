/// Time budget handed to a deferred callback.
///
/// There is no real clock: every `time_remaining` call pretends a fixed
/// amount of time has passed, so flushes are fully deterministic.
#[derive(Debug, Clone)]
pub struct Deadline {
    remaining: f64,
    step: f64,
}

impl Deadline {
    /// `timeout` of `None` never runs out. `Some(0)` is already spent.
    pub fn new(timeout: Option<u64>, step: u64) -> Self {
        Self {
            remaining: timeout.map_or(f64::INFINITY, |t| t as f64),
            step: step as f64,
        }
    }

    pub fn unbounded(step: u64) -> Self {
        Self::new(None, step)
    }

    /// Advance the simulated clock by one step and report what is left,
    /// never below zero.
    pub fn time_remaining(&mut self) -> f64 {
        self.remaining = (self.remaining - self.step).max(0.0);
        self.remaining
    }

    pub fn is_unbounded(&self) -> bool {
        self.remaining.is_infinite()
    }
}
