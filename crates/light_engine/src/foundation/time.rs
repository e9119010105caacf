//! Time management utilities

use std::time::{Duration, Instant};

/// Time elapsed between two frames
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Timestep(f32);

impl Timestep {
    /// Create a timestep from seconds
    pub fn from_seconds(seconds: f32) -> Self {
        Self(seconds)
    }

    /// Create a timestep from milliseconds
    pub fn from_millis(millis: f32) -> Self {
        Self(millis * 0.001)
    }

    /// Timestep in seconds
    pub fn seconds(self) -> f32 {
        self.0
    }

    /// Timestep in milliseconds
    pub fn millis(self) -> f32 {
        self.0 * 1000.0
    }
}

impl From<Duration> for Timestep {
    fn from(duration: Duration) -> Self {
        Self(duration.as_secs_f32())
    }
}

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
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
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame) and return the frame timestep
    pub fn tick(&mut self) -> Timestep {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
        Timestep(self.delta_time)
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestep_conversions() {
        let ts = Timestep::from_millis(16.0);
        assert!((ts.seconds() - 0.016).abs() < 1e-6);
        assert!((ts.millis() - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_timer_counts_frames() {
        let mut timer = Timer::new();
        timer.tick();
        timer.tick();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.total_time() >= 0.0);
    }
}
