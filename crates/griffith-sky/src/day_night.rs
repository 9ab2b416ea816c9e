//! Day/night cycle: sun/moon arc, light radius switch, and sky tint.
//!
//! The cycle alternates a day half and a night half of `half_period` seconds
//! each (plus a 5% slack before the toggle). Sun and moon travel the same arc;
//! the only thing that distinguishes them for lighting is the light radius,
//! which is either effectively unbounded (day) or zero (night).

use glam::{Vec3, Vec4};
use tracing::{debug, info};

use crate::light::{Color, LightDescriptor};
use crate::sky::{DAY_BLUE, SkyBand};

/// Light radius while the sun is up. Large enough that attenuation is nil.
pub const SUN_RADIUS: f32 = 1.0e20;

/// Size of the courtyard lamps and star field intensity driver at night.
pub const NIGHT_AMBIENT_SIZE: f32 = 9.0;

/// Each half cycle runs this much longer than `half_period` before toggling.
pub const PHASE_SLACK: f32 = 1.05;

/// Default seconds per day or night half.
pub const DEFAULT_HALF_PERIOD: i64 = 10;

const WINDOW_EPSILON: f32 = 0.001;

/// Sun color used for the drawn sun body.
pub const SUN_BODY_COLOR: Color = Color::from_hex(0xfcba03);
/// Moon color used for the drawn moon body.
pub const MOON_BODY_COLOR: Color = Color::WHITE;

/// Timers and derived constants of the cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunState {
    pub is_daytime: bool,
    /// Seconds since the last sunrise/sunset toggle.
    pub phase_elapsed: f32,
    /// Seconds since the last full cycle restart.
    pub cycle_elapsed: f32,
    /// Seconds since entering the current sky transition band.
    pub transition_elapsed: f32,
    pub half_period: f32,
    pub transition_window: f32,
    /// Radians per second along the arc.
    pub angular_speed: f32,
}

impl SunState {
    fn with_half_period(half_period: f32) -> Self {
        Self {
            is_daytime: true,
            phase_elapsed: 0.0,
            cycle_elapsed: 0.0,
            transition_elapsed: 0.0,
            half_period,
            transition_window: half_period / 10.0 + WINDOW_EPSILON,
            angular_speed: std::f32::consts::PI / half_period,
        }
    }

    /// Length of one half before the toggle fires.
    pub fn phase_length(&self) -> f32 {
        self.half_period * PHASE_SLACK
    }

    /// Length of a full day + night cycle.
    pub fn cycle_length(&self) -> f32 {
        2.0 * self.half_period * PHASE_SLACK
    }
}

/// Everything the renderer needs from the cycle for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyFrame {
    pub light_position: Vec4,
    pub light_radius: f32,
    pub sky_color: Color,
    pub ambient_size: f32,
    pub star_visibility: f32,
    pub is_daytime: bool,
}

/// Owns the sun state and produces a [`SkyFrame`] per [`advance`](Self::advance).
#[derive(Clone, Debug)]
pub struct DayNightCycle {
    state: SunState,
    band: SkyBand,
    /// Set once the pre-sunrise band or a cycle restart has been seen, so the
    /// post-sunrise fade only runs after an actual night.
    sunrise_pending: bool,
    last_frame: SkyFrame,
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_PERIOD)
    }
}

impl DayNightCycle {
    pub fn new(half_period_seconds: i64) -> Self {
        let mut cycle = Self {
            state: SunState::with_half_period(DEFAULT_HALF_PERIOD as f32),
            band: SkyBand::Steady,
            sunrise_pending: false,
            last_frame: SkyFrame {
                light_position: Vec4::W,
                light_radius: SUN_RADIUS,
                sky_color: DAY_BLUE,
                ambient_size: 0.0,
                star_visibility: 0.0,
                is_daytime: true,
            },
        };
        cycle.set_half_period(half_period_seconds);
        cycle
    }

    /// Advance the cycle by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> SkyFrame {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            debug!("Ignoring invalid day/night delta {dt}");
            0.0
        };

        let state = &mut self.state;
        state.phase_elapsed += dt;
        state.cycle_elapsed += dt;

        if state.phase_elapsed >= state.phase_length() {
            state.phase_elapsed = 0.0;
            state.is_daytime = !state.is_daytime;
            debug!(
                "{} at cycle time {:.2}s",
                if state.is_daytime { "Sunrise" } else { "Sunset" },
                state.cycle_elapsed
            );
        }
        // Each counter drops its own overshoot on reset, so with uneven deltas
        // the restart drifts away from the sunrise flip over many cycles.
        if state.cycle_elapsed >= state.cycle_length() {
            state.cycle_elapsed = 0.0;
            self.sunrise_pending = true;
        }

        let band = self.effective_band();
        if band == SkyBand::Steady {
            self.state.transition_elapsed = 0.0;
        } else if band != self.band {
            self.state.transition_elapsed = 0.0;
        } else {
            self.state.transition_elapsed += dt;
        }
        self.band = band;

        self.last_frame = self.compose_frame();
        self.last_frame
    }

    fn effective_band(&mut self) -> SkyBand {
        let state = &self.state;
        let band = SkyBand::classify(
            state.cycle_elapsed,
            state.half_period,
            state.transition_window,
        );
        match band {
            SkyBand::PreSunrise => {
                self.sunrise_pending = true;
                band
            }
            SkyBand::PostSunrise if self.sunrise_pending => band,
            SkyBand::PostSunrise => SkyBand::Steady,
            _ => {
                self.sunrise_pending = false;
                band
            }
        }
    }

    fn compose_frame(&self) -> SkyFrame {
        let state = &self.state;
        let is_daytime = state.is_daytime;
        SkyFrame {
            light_position: arc_position(state.angular_speed * state.phase_elapsed).extend(1.0),
            light_radius: if is_daytime { SUN_RADIUS } else { 0.0 },
            sky_color: self
                .band
                .color(state.transition_elapsed, state.transition_window, is_daytime),
            ambient_size: if is_daytime { 0.0 } else { NIGHT_AMBIENT_SIZE },
            star_visibility: if is_daytime { 0.0 } else { 1.0 },
            is_daytime,
        }
    }

    /// Change the half period (clamped to at least one second) and restart
    /// the cycle at sunrise.
    pub fn set_half_period(&mut self, seconds: i64) {
        let clamped = seconds.max(1);
        if clamped != seconds {
            debug!("Half period {seconds}s clamped to {clamped}s");
        }
        self.state = SunState::with_half_period(clamped as f32);
        self.band = SkyBand::Steady;
        self.sunrise_pending = false;
        self.last_frame = self.compose_frame();
        info!("Day/night half period set to {clamped}s");
    }

    /// Shorten each half by one second.
    pub fn speed_up(&mut self) {
        self.set_half_period(self.half_period_seconds() - 1);
    }

    /// Lengthen each half by one second.
    pub fn slow_down(&mut self) {
        self.set_half_period(self.half_period_seconds() + 1);
    }

    pub fn half_period_seconds(&self) -> i64 {
        self.state.half_period.round() as i64
    }

    pub fn sun_state(&self) -> &SunState {
        &self.state
    }

    pub fn sky_band(&self) -> SkyBand {
        self.band
    }

    /// The frame produced by the last advance (or reset).
    pub fn last_frame(&self) -> SkyFrame {
        self.last_frame
    }

    /// The sun or moon as a point light.
    pub fn light(&self) -> LightDescriptor {
        let frame = &self.last_frame;
        LightDescriptor::point(frame.light_position.truncate(), Color::WHITE, frame.light_radius)
    }

    /// Color for the visible sun or moon body.
    pub fn body_color(&self) -> Color {
        if self.state.is_daytime {
            SUN_BODY_COLOR
        } else {
            MOON_BODY_COLOR
        }
    }
}

/// Point on the sun/moon arc at `angle` radians.
pub fn arc_position(angle: f32) -> Vec3 {
    Vec3::new(
        200.0 + 200.0 * angle.cos(),
        5.0 + 200.0 * angle.sin(),
        215.0 + 190.0 * (angle / 2.0).sin(),
    )
}
