//! Tick rate and timing utilities

use std::time::{Duration, Instant};

/// Tick rate the server simulates at. The protocol never announces it, so
/// the client assumes the server's default.
pub const SERVER_TPS: u32 = 30;

/// Seconds of simulated time covered by one server tick
pub const SECS_PER_TICK: f64 = 1.0 / SERVER_TPS as f64;

/// Delta time applied to wake samples per tick (in seconds)
pub fn tick_delta() -> f64 {
    SECS_PER_TICK
}

/// Interval between render passes for the given frame rate
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(fps.max(1)))
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
