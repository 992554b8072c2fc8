use std::time::{Duration, Instant};

/// Longest frame step handed to the simulation; a stalled window should not teleport the camera.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

pub struct FrameClock {
    last: Instant,
    max_delta: Duration,
    pub delta: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_max_delta(MAX_FRAME_DELTA)
    }

    pub fn with_max_delta(max_delta: Duration) -> Self {
        let now = Instant::now();
        Self { last: now, max_delta, delta: Duration::ZERO }
    }

    pub fn tick(&mut self) {
        self.advance_to(Instant::now());
    }

    fn advance_to(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last).min(self.max_delta);
        self.last = now;
    }

    /// Restarts timing without producing a step, e.g. after the window regains focus.
    pub fn reset(&mut self) {
        self.last = Instant::now();
        self.delta = Duration::ZERO;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
