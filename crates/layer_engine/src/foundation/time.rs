//! Time management utilities

use std::time::Instant;

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

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
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

/// Fixed timestep accumulator
///
/// Converts variable frame times into a whole number of fixed steps.
/// Steps beyond `max_steps` in a single frame are dropped so a long stall
/// cannot snowball into ever longer frames.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f32,
    max_steps: u32,
    accumulator: f32,
}

/// Result of advancing a [`FixedStep`] by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    /// Number of fixed steps to run this frame
    pub steps: u32,
    /// Time dropped because the step cap was hit, in seconds
    pub dropped: f32,
    /// Fraction of a step left in the accumulator, in `[0, 1)`
    pub alpha: f32,
}

impl FixedStep {
    /// Create an accumulator with the given step length and per-frame cap
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step,
            max_steps,
            accumulator: 0.0,
        }
    }

    /// Length of one fixed step in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Time currently held in the accumulator
    pub fn accumulated(&self) -> f32 {
        self.accumulator
    }

    /// Feed elapsed frame time and work out how many steps to run
    pub fn advance(&mut self, elapsed: f32) -> StepPlan {
        self.accumulator += elapsed.max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }

        let mut dropped = 0.0;
        if self.accumulator >= self.step {
            // Keep the partial step so interpolation stays smooth
            let kept = self.accumulator % self.step;
            dropped = self.accumulator - kept;
            self.accumulator = kept;
        }

        StepPlan {
            steps,
            dropped,
            alpha: self.accumulator / self.step,
        }
    }

    /// Discard any accumulated time
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_timer_counts_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.total_time() >= timer.delta_time());
    }

    #[test]
    fn test_short_frame_runs_no_steps() {
        let mut fixed = FixedStep::new(0.1, 5);
        let plan = fixed.advance(0.05);
        assert_eq!(plan.steps, 0);
        assert_relative_eq!(plan.alpha, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_accumulates_across_frames() {
        let mut fixed = FixedStep::new(0.1, 5);
        assert_eq!(fixed.advance(0.06).steps, 0);
        let plan = fixed.advance(0.06);
        assert_eq!(plan.steps, 1);
        assert_relative_eq!(fixed.accumulated(), 0.02, epsilon = 1e-5);
    }

    #[test]
    fn test_step_cap_drops_excess() {
        let mut fixed = FixedStep::new(0.1, 3);
        let plan = fixed.advance(1.05);
        assert_eq!(plan.steps, 3);
        assert_relative_eq!(plan.dropped, 0.7, epsilon = 1e-4);
        assert_relative_eq!(fixed.accumulated(), 0.05, epsilon = 1e-4);
    }

    #[test]
    fn test_negative_elapsed_is_ignored() {
        let mut fixed = FixedStep::new(0.1, 3);
        let plan = fixed.advance(-1.0);
        assert_eq!(plan.steps, 0);
        assert_relative_eq!(fixed.accumulated(), 0.0);
    }
}
