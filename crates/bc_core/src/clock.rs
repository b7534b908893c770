//! Frame clock: an external collaborator hands back `(total_time,
//! elapsed_time)` each tick; this wraps that into a running clock.

use std::time::{Duration, Instant};

/// Tracks total elapsed time and per-tick delta, and the running frame
/// index used by the vehicle controller's time-slicing and the GPU
/// memory subsystem's frame tagging.
pub struct Clock {
    start: Instant,
    last_tick: Instant,
    elapsed: Duration,
    delta: Duration,
    frame_index: u64,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            frame_index: 0,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last_tick;
        self.elapsed = now - self.start;
        self.last_tick = now;
        self.frame_index += 1;
    }

    #[must_use]
    pub fn total_time(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    #[must_use]
    pub fn elapsed_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
