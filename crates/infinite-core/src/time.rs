//! Simulation clock for the Infinite engine
//!
//! Produces the monotonically increasing `now` timestamps (seconds) that timed
//! systems compare against their windows and durations, and splits frame time
//! into fixed simulation steps.

use serde::{Deserialize, Serialize};

/// Configuration for game time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// How many in-game seconds pass per real second
    pub time_scale: f32,
    /// Fixed timestep for simulation ticks (in seconds)
    pub fixed_timestep: f32,
    /// Longest frame accepted before clamping (avoids a burst of catch-up steps)
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            fixed_timestep: 1.0 / 60.0,
            max_delta_time: 0.25,
        }
    }
}

/// What one call to [`GameTime::advance`] produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Scaled, clamped frame delta in seconds
    pub delta: f32,
    /// Fixed simulation steps now due
    pub fixed_steps: u32,
}

#[derive(Debug, Clone, Default)]
pub struct GameTime {
    pub config: TimeConfig,
    total_time: f64,
    frame_count: u64,
    paused: bool,
    accumulator: f32,
}

impl GameTime {
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Current timestamp in seconds
    pub fn now(&self) -> f64 {
        self.total_time
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Advance by one frame of `raw_delta` real seconds.
    ///
    /// A paused clock still counts the frame but neither moves `now` nor
    /// accumulates fixed steps.
    pub fn advance(&mut self, raw_delta: f32) -> FrameStep {
        self.frame_count += 1;
        if self.paused {
            return FrameStep {
                delta: 0.0,
                fixed_steps: 0,
            };
        }

        let delta = raw_delta.clamp(0.0, self.config.max_delta_time) * self.config.time_scale;
        self.total_time += delta as f64;
        self.accumulator += delta;

        let mut fixed_steps = 0;
        if self.config.fixed_timestep > 0.0 {
            while self.accumulator >= self.config.fixed_timestep {
                self.accumulator -= self.config.fixed_timestep;
                fixed_steps += 1;
            }
        }
        FrameStep { delta, fixed_steps }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let mut time = GameTime::default();
        let step = time.advance(0.016);
        assert!(step.delta > 0.0);
        assert_eq!(time.frame_count(), 1);
        assert!(time.now() > 0.0);
    }

    #[test]
    fn test_paused_clock_holds_still() {
        let mut time = GameTime::default();
        time.pause();
        assert_eq!(time.advance(0.5).fixed_steps, 0);
        assert_eq!(time.now(), 0.0);
        assert_eq!(time.frame_count(), 1);

        time.resume();
        time.advance(0.016);
        assert!(time.now() > 0.0);
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut time = GameTime::default();
        assert_eq!(time.advance(5.0).delta, 0.25);
        assert_eq!(time.advance(-1.0).delta, 0.0);
    }

    #[test]
    fn test_fixed_steps_carry_remainder() {
        let mut time = GameTime::new(TimeConfig {
            fixed_timestep: 0.1,
            ..Default::default()
        });
        assert_eq!(time.advance(0.25).fixed_steps, 2);
        // 0.05 carried over plus 0.06 crosses one more step
        assert_eq!(time.advance(0.06).fixed_steps, 1);
    }

    #[test]
    fn test_time_scale() {
        let mut time = GameTime::default();
        time.set_time_scale(2.0);
        time.advance(0.1);
        assert!((time.now() - 0.2).abs() < 1e-6);

        time.set_time_scale(-3.0);
        assert_eq!(time.advance(0.1).delta, 0.0);
    }
}
