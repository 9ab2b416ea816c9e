//! Sky state for the Griffith scene: the day/night cycle, the sky tint
//! bands, and the light descriptor handed to renderers.

pub mod day_night;
pub mod light;
pub mod sky;

pub use day_night::{
    DEFAULT_HALF_PERIOD, DayNightCycle, MOON_BODY_COLOR, NIGHT_AMBIENT_SIZE, PHASE_SLACK,
    SUN_BODY_COLOR, SUN_RADIUS, SkyFrame, SunState, arc_position,
};
pub use light::{Color, LightDescriptor, LightUniform};
pub use sky::{DAY_BLUE, NIGHT_NAVY, PRE_DAWN_NAVY, SkyBand, sine_ease};
