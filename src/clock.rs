//! Simulation clock: wall-clock sampled in interactive mode, fixed-step in
//! recording mode. Time only moves forward; a missed frame deadline shows up
//! as a larger delta, never as desynchronization.

use std::time::Instant;

enum Mode {
    /// Sample wall-clock time directly every tick
    Realtime { start: Instant },
    /// Advance by a constant step per tick (frame capture)
    FixedStep { dt_s: f32 },
}

pub struct Clock {
    mode: Mode,
    sim_time_s: f32,
}

impl Clock {
    /// Wall-clock driven simulation time starting at zero
    pub fn realtime() -> Self {
        Self {
            mode: Mode::Realtime {
                start: Instant::now(),
            },
            sim_time_s: 0.0,
        }
    }

    /// Fixed-step time for recording: frame n observes `n / fps` seconds
    pub fn fixed_step(fps: u32) -> Self {
        Self {
            mode: Mode::FixedStep {
                dt_s: 1.0 / fps as f32,
            },
            sim_time_s: 0.0,
        }
    }

    /// Advance to the next frame's simulation time and return it
    pub fn tick(&mut self) -> f32 {
        match self.mode {
            Mode::Realtime { start } => {
                self.sim_time_s = start.elapsed().as_secs_f32();
            }
            Mode::FixedStep { dt_s } => {
                self.sim_time_s += dt_s;
            }
        }
        self.sim_time_s
    }

    /// Simulation time of the current frame
    pub fn sim_time_s(&self) -> f32 {
        self.sim_time_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_advances_by_constant_delta() {
        let mut clock = Clock::fixed_step(60);
        let t1 = clock.tick();
        let t2 = clock.tick();
        assert!((t1 - 1.0 / 60.0).abs() < 1e-6);
        assert!((t2 - 2.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_time_is_monotonic() {
        let mut clock = Clock::realtime();
        let mut last = clock.tick();
        for _ in 0..10 {
            let t = clock.tick();
            assert!(t >= last);
            last = t;
        }
    }
}
