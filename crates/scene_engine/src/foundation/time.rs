//! Time management utilities

use std::time::Instant;

/// Monotonic frame timer
///
/// The first tick after creation or [`Timer::reset`] reports a zero delta.
/// A clock that appears to go backwards also yields zero, so frame deltas
/// are never negative.
#[derive(Debug, Clone)]
pub struct Timer {
    last_tick: Option<Instant>,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_tick: None,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance to `now` and return the delta in seconds
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        self.delta_time = match self.last_tick {
            Some(previous) => now.saturating_duration_since(previous).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);
        self.total_time += self.delta_time;
        self.frame_count += 1;
        self.delta_time
    }

    /// Forget the previous tick so the next one reports a zero delta
    pub fn reset(&mut self) {
        self.last_tick = None;
        self.delta_time = 0.0;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed frame time
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
