//! Fixed-timestep accumulator.
//!
//! Decouples particle simulation (fixed rate, 20 Hz by default) from the
//! render frame rate. Each call to [`FixedStepper::advance`] runs zero or more
//! ticks and returns the interpolation alpha for drawing between the last two
//! simulated states.

use tracing::{debug, warn};

/// Default simulation step: 20 Hz.
pub const DEFAULT_TICK_DT: f32 = 1.0 / 20.0;

/// Maximum scaled frame time fed into the accumulator per frame.
/// Longer frames are clamped and the simulation slows down instead of
/// running dozens of catch-up ticks.
pub const MAX_FRAME_TIME: f32 = 0.1;

/// Bounds for the user-controlled time scale.
pub const MIN_TIME_SCALE: f32 = 1.0 / 1024.0;
pub const MAX_TIME_SCALE: f32 = 1024.0;

/// Accumulator state of the fixed-step loop.
#[derive(Debug, Clone)]
pub struct FixedStepper {
    dt: f32,
    accumulator: f32,
    time_scale: f32,
    sim_time: f64,
    steps_taken: u64,
}

impl FixedStepper {
    /// Create a stepper ticking every `dt` seconds. Non-positive or
    /// non-finite steps fall back to [`DEFAULT_TICK_DT`].
    pub fn new(dt: f32) -> Self {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            warn!("Invalid tick dt {dt}, using {DEFAULT_TICK_DT}");
            DEFAULT_TICK_DT
        };
        Self {
            dt,
            accumulator: 0.0,
            time_scale: 1.0,
            sim_time: 0.0,
            steps_taken: 0,
        }
    }

    /// Create a stepper from a tick rate in Hz (minimum 1).
    pub fn with_tick_hz(hz: u32) -> Self {
        Self::new(1.0 / hz.max(1) as f32)
    }

    /// Feed one frame's delta and run every tick that fits.
    ///
    /// `tick(dt)` is called zero or more times with the fixed step. Returns
    /// the interpolation alpha in `[0, 1)`.
    pub fn advance(&mut self, frame_delta: f32, mut tick: impl FnMut(f32)) -> f32 {
        let frame_delta = if frame_delta.is_finite() {
            frame_delta.max(0.0)
        } else {
            0.0
        };
        let scaled = frame_delta * self.time_scale;
        if scaled > MAX_FRAME_TIME {
            debug!(
                "Weather frame time {:.1}ms clamped to {:.1}ms",
                scaled * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
        }
        self.accumulator += scaled.min(MAX_FRAME_TIME);

        while self.accumulator >= self.dt {
            tick(self.dt);
            self.accumulator -= self.dt;
            self.sim_time += self.dt as f64;
            self.steps_taken += 1;
        }

        self.alpha()
    }

    /// Interpolation alpha of the current accumulator.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        let clamped = if scale.is_finite() {
            scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE)
        } else {
            1.0
        };
        if clamped != scale {
            warn!("Time scale {scale} clamped to {clamped}");
        }
        self.time_scale = clamped;
    }

    /// Double the time scale.
    pub fn speed_up(&mut self) {
        self.set_time_scale(self.time_scale * 2.0);
    }

    /// Halve the time scale.
    pub fn slow_down(&mut self) {
        self.set_time_scale(self.time_scale / 2.0);
    }

    /// Ticks executed since creation.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Simulated seconds since creation.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_DT)
    }
}
