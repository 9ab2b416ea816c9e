//! Fixed-timestep weather particles: rain, snow and fog.

mod particle;
mod simulation;
mod stepper;

pub use particle::{DROP_SIZE, Particle, ParticleKind, SphereCollider};
pub use simulation::{
    EARTH_GRAVITY, FLOOR_HEIGHT, FOG_FLOOR, RAIN_IMPACT_LIFETIME, SPAWN_BATCH, SNOW_GRAVITY,
    WeatherMode, WeatherSimulation,
};
pub use stepper::{DEFAULT_TICK_DT, FixedStepper, MAX_FRAME_TIME};
