//! Frame rate measurement between consecutive rendered frames.

use std::time::Instant;

/// Instantaneous frame rate from the gap between two consecutive ticks
///
/// The previous timestamp is seeded on construction, so the first tick
/// already measures a real interval.
#[derive(Debug, Clone)]
pub struct FrameClock {
    previous: Instant,
    fps: f64,
}

impl FrameClock {
    /// Start the clock now
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Start the clock at a given instant
    #[must_use]
    pub fn starting_at(previous: Instant) -> Self {
        Self { previous, fps: 0.0 }
    }

    /// Record a frame now and return the updated frame rate
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Record a frame at `now` and return the updated frame rate
    ///
    /// A zero or negative interval keeps the last rate instead of dividing
    /// by zero; the stored timestamp never moves backwards.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.previous).as_secs_f64();
        if elapsed > 0.0 {
            self.fps = 1.0 / elapsed;
            self.previous = now;
        }
        self.fps
    }

    /// Last computed frame rate
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
