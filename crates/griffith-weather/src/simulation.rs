//! Weather particle simulation: spawning, per-kind physics and culling,
//! driven by a [`FixedStepper`].

use glam::{Mat4, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::particle::{Particle, ParticleKind};
use crate::stepper::FixedStepper;

pub const EARTH_GRAVITY: f32 = 9.8;
pub const SNOW_GRAVITY: f32 = 0.1;
/// Below this height a falling particle has reached the ground.
pub const FLOOR_HEIGHT: f32 = -8.0;
/// Rain keeps this fraction of its speed after a floor bounce.
pub const RAIN_RESTITUTION: f32 = 0.2;
/// Rain farther than this from the origin is culled.
pub const RAIN_CULL_DISTANCE: f32 = 150.0;
/// Rain at or below this speed is culled.
pub const RAIN_MIN_SPEED: f32 = 3.0;
/// Seconds rain survives after its first floor bounce.
pub const RAIN_IMPACT_LIFETIME: f32 = 1.0;
/// Drifting fog at or below this height is culled while fog is active.
pub const FOG_FLOOR: f32 = 14.0;
/// Particles spawned per tick in the combined variant.
pub const SPAWN_BATCH: usize = 20;

const SPAWN_HEIGHT: f32 = 30.0;
const SPAWN_HALF_EXTENT: f32 = 50.0;
const SPAWN_JITTER: f32 = 20.0;
const FALL_SPEED: f32 = 3.0;
const FOG_BACKDROP_SIZE: f32 = 450.0;
const FOG_BACKDROP_POSITION: Vec3 = Vec3::new(15.0, 15.0, 15.0);
const FOG_DRIFT: Vec3 = Vec3::new(1.0, 1.0, 1.0);

/// Which toggle semantics the simulation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeatherMode {
    /// Rain only, behind a single on/off toggle. Spawning refills the pool
    /// to the cap in one tick.
    RainOnly,
    /// Rain, snow and fog; at most one enabled at a time.
    #[default]
    Combined,
}

/// The fixed-step weather simulation.
pub struct WeatherSimulation {
    mode: WeatherMode,
    rain_enabled: bool,
    snow_enabled: bool,
    fog_enabled: bool,
    particles: Vec<Particle>,
    stepper: FixedStepper,
    rng: ChaCha8Rng,
}

impl WeatherSimulation {
    pub fn new(mode: WeatherMode, stepper: FixedStepper, seed: u64) -> Self {
        Self {
            mode,
            rain_enabled: false,
            snow_enabled: false,
            fog_enabled: false,
            particles: Vec::new(),
            stepper,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn mode(&self) -> WeatherMode {
        self.mode
    }

    /// The kind currently spawning, if any.
    pub fn active_kind(&self) -> Option<ParticleKind> {
        if self.rain_enabled {
            Some(ParticleKind::Rain)
        } else if self.snow_enabled {
            Some(ParticleKind::Snow)
        } else if self.fog_enabled {
            Some(ParticleKind::Fog)
        } else {
            None
        }
    }

    pub fn is_enabled(&self, kind: ParticleKind) -> bool {
        match kind {
            ParticleKind::Rain => self.rain_enabled,
            ParticleKind::Snow => self.snow_enabled,
            ParticleKind::Fog => self.fog_enabled,
        }
    }

    /// Flip `kind`. In the combined variant the other kinds are switched off;
    /// the rain-only variant ignores snow and fog.
    pub fn toggle(&mut self, kind: ParticleKind) {
        match self.mode {
            WeatherMode::RainOnly => {
                if kind == ParticleKind::Rain {
                    self.rain_enabled = !self.rain_enabled;
                } else {
                    debug!("Ignoring {} toggle in rain-only mode", kind.label());
                    return;
                }
            }
            WeatherMode::Combined => {
                let enabled = !self.is_enabled(kind);
                self.rain_enabled = false;
                self.snow_enabled = false;
                self.fog_enabled = false;
                match kind {
                    ParticleKind::Rain => self.rain_enabled = enabled,
                    ParticleKind::Snow => self.snow_enabled = enabled,
                    ParticleKind::Fog => self.fog_enabled = enabled,
                }
            }
        }
        info!(
            "Weather {} {}",
            kind.label(),
            if self.is_enabled(kind) { "on" } else { "off" }
        );
    }

    pub fn toggle_rain(&mut self) {
        self.toggle(ParticleKind::Rain);
    }

    pub fn toggle_snow(&mut self) {
        self.toggle(ParticleKind::Snow);
    }

    pub fn toggle_fog(&mut self) {
        self.toggle(ParticleKind::Fog);
    }

    /// Double the simulation time scale.
    pub fn speed_up(&mut self) {
        self.stepper.speed_up();
        info!("Weather time scale {}", self.stepper.time_scale());
    }

    /// Halve the simulation time scale.
    pub fn slow_down(&mut self) {
        self.stepper.slow_down();
        info!("Weather time scale {}", self.stepper.time_scale());
    }

    pub fn stepper(&self) -> &FixedStepper {
        &self.stepper
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn count(&self, kind: ParticleKind) -> usize {
        self.particles.iter().filter(|p| p.kind == kind).count()
    }

    /// Run the fixed-step loop for one frame and return the blend alpha.
    pub fn step(&mut self, frame_delta: f32) -> f32 {
        let spawn = self.spawn_state();
        let Self {
            stepper,
            particles,
            rng,
            ..
        } = self;
        stepper.advance(frame_delta, |dt| {
            update_state(particles, rng, spawn, dt);
            for particle in particles.iter_mut() {
                particle.advance(dt);
            }
        })
    }

    /// One simulation tick without integration: spawn, forces, floor
    /// collisions, culling.
    pub fn update_state(&mut self, dt: f32) {
        let spawn = self.spawn_state();
        update_state(&mut self.particles, &mut self.rng, spawn, dt);
    }

    fn spawn_state(&self) -> SpawnState {
        SpawnState {
            mode: self.mode,
            rain: self.rain_enabled,
            snow: self.snow_enabled,
            fog: self.fog_enabled,
        }
    }

    /// Draw transform of every particle at interpolation `alpha`.
    pub fn blended_transforms(
        &self,
        alpha: f32,
    ) -> impl Iterator<Item = (ParticleKind, Mat4)> + '_ {
        self.particles.iter().map(move |p| (p.kind, p.blend(alpha)))
    }

    #[cfg(test)]
    pub(crate) fn particles_mut(&mut self) -> &mut Vec<Particle> {
        &mut self.particles
    }
}

#[derive(Clone, Copy)]
struct SpawnState {
    mode: WeatherMode,
    rain: bool,
    snow: bool,
    fog: bool,
}

fn update_state(
    particles: &mut Vec<Particle>,
    rng: &mut ChaCha8Rng,
    spawn: SpawnState,
    dt: f32,
) {
    let before = particles.len();
    if spawn.rain {
        let batch = match spawn.mode {
            WeatherMode::RainOnly => ParticleKind::Rain.cap(),
            WeatherMode::Combined => SPAWN_BATCH,
        };
        spawn_falling(particles, rng, ParticleKind::Rain, batch);
    }
    if spawn.snow {
        spawn_falling(particles, rng, ParticleKind::Snow, SPAWN_BATCH);
    }
    if spawn.fog {
        spawn_fog(particles, rng);
    }
    let spawned = particles.len() - before;

    for particle in particles.iter_mut() {
        apply_physics(particle, spawn.fog, dt);
    }

    let alive = particles.len();
    particles.retain(|p| !should_cull(p, spawn.fog));
    debug!(
        spawned,
        culled = alive - particles.len(),
        total = particles.len(),
        "weather tick"
    );
}

/// Per-component offset uniform in `[-scale/2, scale/2)`.
fn jitter(rng: &mut ChaCha8Rng, scale: f32) -> Vec3 {
    Vec3::new(
        scale * (rng.random::<f32>() - 0.5),
        scale * (rng.random::<f32>() - 0.5),
        scale * (rng.random::<f32>() - 0.5),
    )
}

fn random_spin_axis(rng: &mut ChaCha8Rng) -> Vec3 {
    jitter(rng, 1.0).normalize_or(Vec3::Y)
}

fn spawn_falling(
    particles: &mut Vec<Particle>,
    rng: &mut ChaCha8Rng,
    kind: ParticleKind,
    batch: usize,
) {
    let room = kind.cap().saturating_sub(particles.len());
    for _ in 0..batch.min(room) {
        let position = Vec3::new(
            rng.random_range(-SPAWN_HALF_EXTENT..SPAWN_HALF_EXTENT),
            SPAWN_HEIGHT,
            rng.random_range(-SPAWN_HALF_EXTENT..SPAWN_HALF_EXTENT),
        ) + jitter(rng, SPAWN_JITTER);
        let velocity = (Vec3::NEG_Y + jitter(rng, 2.0)).normalize_or(Vec3::NEG_Y) * FALL_SPEED;
        let spin = rng.random::<f32>();
        let size = Vec3::new(1.0, 1.0 + rng.random::<f32>(), 1.0);
        let axis = random_spin_axis(rng);
        particles.push(Particle::new(kind, position, velocity, spin, axis, size));
    }
}

fn spawn_fog(particles: &mut Vec<Particle>, rng: &mut ChaCha8Rng) {
    let cap = ParticleKind::Fog.cap();
    if particles.is_empty() {
        let axis = random_spin_axis(rng);
        particles.push(Particle::new(
            ParticleKind::Fog,
            FOG_BACKDROP_POSITION,
            Vec3::ZERO,
            0.0,
            axis,
            Vec3::splat(FOG_BACKDROP_SIZE),
        ));
    }
    if particles.len() < cap {
        let position = Vec3::new(
            rng.random_range(-50.0..10.0),
            rng.random_range(15.0..50.0),
            rng.random_range(-50.0..20.0),
        );
        let size = Vec3::new(
            30.0 + 30.0 * rng.random::<f32>(),
            10.0 + 50.0 * rng.random::<f32>(),
            30.0 + 30.0 * rng.random::<f32>(),
        );
        let axis = random_spin_axis(rng);
        particles.push(Particle::new(
            ParticleKind::Fog,
            position,
            FOG_DRIFT,
            0.0,
            axis,
            size,
        ));
    }
}

fn apply_physics(particle: &mut Particle, fog_active: bool, dt: f32) {
    match particle.kind {
        ParticleKind::Rain => {
            particle.linear_velocity.y -= EARTH_GRAVITY * dt;
            if particle.position.y < FLOOR_HEIGHT && particle.linear_velocity.y < 0.0 {
                particle.linear_velocity.y *= -RAIN_RESTITUTION;
                particle.mark_ground_impact();
            }
            if particle.has_hit_ground() {
                particle.time_since_ground_impact += dt;
            }
        }
        ParticleKind::Snow => particle.linear_velocity.y -= SNOW_GRAVITY * dt,
        ParticleKind::Fog if fog_active => {}
        ParticleKind::Fog => particle.linear_velocity.y -= EARTH_GRAVITY * dt,
    }
}

fn should_cull(particle: &Particle, fog_active: bool) -> bool {
    let fell_through_floor =
        particle.position.y < FLOOR_HEIGHT && particle.linear_velocity.y < 0.0;
    match particle.kind {
        ParticleKind::Rain => {
            particle.position.length() >= RAIN_CULL_DISTANCE
                || particle.linear_velocity.length() <= RAIN_MIN_SPEED
                || particle.time_since_ground_impact >= RAIN_IMPACT_LIFETIME
        }
        ParticleKind::Snow => fell_through_floor,
        ParticleKind::Fog if fog_active => particle.position.y <= FOG_FLOOR,
        ParticleKind::Fog => fell_through_floor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.05;

    fn create_sim(mode: WeatherMode) -> WeatherSimulation {
        WeatherSimulation::new(mode, FixedStepper::default(), 42)
    }

    fn rain_drop(position: Vec3, velocity: Vec3) -> Particle {
        Particle::new(ParticleKind::Rain, position, velocity, 0.0, Vec3::Y, Vec3::ONE)
    }

    #[test]
    fn test_starts_clear() {
        let mut sim = create_sim(WeatherMode::Combined);
        assert_eq!(sim.active_kind(), None);
        sim.update_state(DT);
        assert!(sim.is_empty());
    }

    #[test]
    fn test_combined_toggles_are_exclusive() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.toggle_rain();
        assert_eq!(sim.active_kind(), Some(ParticleKind::Rain));
        sim.toggle_snow();
        assert_eq!(sim.active_kind(), Some(ParticleKind::Snow));
        assert!(!sim.is_enabled(ParticleKind::Rain));
        sim.toggle_fog();
        assert_eq!(sim.active_kind(), Some(ParticleKind::Fog));
        sim.toggle_fog();
        assert_eq!(sim.active_kind(), None);
    }

    #[test]
    fn test_rain_only_ignores_other_kinds() {
        let mut sim = create_sim(WeatherMode::RainOnly);
        sim.toggle_snow();
        sim.toggle_fog();
        assert_eq!(sim.active_kind(), None);
        sim.toggle_rain();
        assert_eq!(sim.active_kind(), Some(ParticleKind::Rain));
    }

    #[test]
    fn test_rain_only_fills_pool_in_one_tick() {
        let mut sim = create_sim(WeatherMode::RainOnly);
        sim.toggle_rain();
        sim.update_state(DT);
        // Fresh drops all fall faster than the cull speed.
        assert_eq!(sim.len(), ParticleKind::Rain.cap());
    }

    #[test]
    fn test_combined_rain_spawns_batch() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.toggle_rain();
        sim.update_state(DT);
        assert_eq!(sim.len(), SPAWN_BATCH);
        for p in sim.particles() {
            assert!(p.linear_velocity.y < 0.0);
            assert!((20.0..=40.0).contains(&p.position.y));
            assert!(p.size.y >= 1.0 && p.size.y < 2.0);
        }
    }

    #[test]
    fn test_pool_never_exceeds_cap() {
        for kind in ParticleKind::ALL {
            let mut sim = create_sim(WeatherMode::Combined);
            sim.toggle(kind);
            for _ in 0..400 {
                sim.step(DT);
                assert!(
                    sim.len() <= kind.cap(),
                    "{} pool {} above cap",
                    kind.label(),
                    sim.len()
                );
            }
        }

        let mut sim = create_sim(WeatherMode::RainOnly);
        sim.toggle_rain();
        for _ in 0..50 {
            sim.step(DT);
            assert!(sim.len() <= ParticleKind::Rain.cap());
        }
    }

    #[test]
    fn test_spawn_batch_truncated_at_cap() {
        let mut particles: Vec<Particle> = (0..ParticleKind::Snow.cap() - 5)
            .map(|_| rain_drop(Vec3::ZERO, Vec3::NEG_Y * 10.0))
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        spawn_falling(&mut particles, &mut rng, ParticleKind::Snow, SPAWN_BATCH);
        assert_eq!(particles.len(), ParticleKind::Snow.cap());
    }

    #[test]
    fn test_rain_floor_bounce() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.particles_mut()
            .push(rain_drop(Vec3::new(0.0, -9.0, 0.0), Vec3::new(0.0, -20.0, 0.0)));
        sim.update_state(DT);

        let p = &sim.particles()[0];
        let fallen = -20.0 - EARTH_GRAVITY * DT;
        assert!(p.linear_velocity.y > 0.0);
        assert!((p.linear_velocity.y - (-fallen * RAIN_RESTITUTION)).abs() < 1e-5);
        assert!(p.has_hit_ground());
        assert!((p.time_since_ground_impact - DT).abs() < 1e-6);
    }

    #[test]
    fn test_falling_drop_bounces_and_expires_through_step() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.particles_mut()
            .push(rain_drop(Vec3::new(0.0, 30.0, 0.0), Vec3::NEG_Y * 10.0));

        let mut bounced = false;
        let mut last_timer = 0.0;
        for _ in 0..200 {
            let Some(before) = sim.particles().first().map(|p| p.linear_velocity.y) else {
                break;
            };
            let steps = sim.stepper().steps_taken();
            sim.step(DT);
            assert_eq!(sim.stepper().steps_taken(), steps + 1);
            let Some(p) = sim.particles().first() else {
                break;
            };

            if !bounced {
                if p.has_hit_ground() {
                    bounced = true;
                    let fallen = before - EARTH_GRAVITY * DT;
                    assert!(fallen < 0.0);
                    assert!(p.linear_velocity.y > 0.0);
                    assert!((p.linear_velocity.y - (-fallen * RAIN_RESTITUTION)).abs() < 1e-5);
                    assert!(p.time_since_ground_impact > 0.0);
                    last_timer = p.time_since_ground_impact;
                } else {
                    assert!((p.linear_velocity.y - (before - EARTH_GRAVITY * DT)).abs() < 1e-5);
                }
            } else {
                assert!(p.time_since_ground_impact > last_timer);
                last_timer = p.time_since_ground_impact;
            }
        }

        assert!(bounced);
        assert!(sim.is_empty());
    }

    #[test]
    fn test_impact_timer_keeps_running_after_bounce() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.particles_mut()
            .push(rain_drop(Vec3::new(0.0, -9.0, 0.0), Vec3::new(0.0, -40.0, 0.0)));
        sim.update_state(DT);
        sim.particles_mut()[0].position.y = 0.0;
        sim.update_state(DT);
        let p = &sim.particles()[0];
        assert!((p.time_since_ground_impact - 2.0 * DT).abs() < 1e-6);
    }

    #[test]
    fn test_rain_culled_after_impact_lifetime() {
        let mut sim = create_sim(WeatherMode::Combined);
        let mut drop = rain_drop(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -20.0, 0.0));
        drop.mark_ground_impact();
        drop.time_since_ground_impact = RAIN_IMPACT_LIFETIME;
        sim.particles_mut().push(drop);
        sim.particles_mut()
            .push(rain_drop(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -20.0, 0.0)));
        sim.update_state(DT);
        assert_eq!(sim.len(), 1);
        assert!(!sim.particles()[0].has_hit_ground());
    }

    #[test]
    fn test_rain_culled_when_far_or_slow() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.particles_mut()
            .push(rain_drop(Vec3::new(200.0, 0.0, 0.0), Vec3::new(0.0, -20.0, 0.0)));
        sim.particles_mut()
            .push(rain_drop(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 0.1, 0.0)));
        sim.update_state(DT);
        assert!(sim.is_empty());
    }

    #[test]
    fn test_snow_falls_slowly_and_is_absorbed() {
        let mut sim = create_sim(WeatherMode::Combined);
        let mut flake = rain_drop(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -3.0, 0.0));
        flake.kind = ParticleKind::Snow;
        sim.particles_mut().push(flake.clone());
        sim.update_state(DT);
        let vy = sim.particles()[0].linear_velocity.y;
        assert!((vy - (-3.0 - SNOW_GRAVITY * DT)).abs() < 1e-6);

        flake.position.y = -9.0;
        sim.particles_mut().push(flake);
        sim.update_state(DT);
        assert_eq!(sim.len(), 1);
    }

    #[test]
    fn test_fog_spawns_backdrop_then_drift() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.toggle_fog();
        sim.update_state(DT);
        assert_eq!(sim.count(ParticleKind::Fog), 2);
        let backdrop = &sim.particles()[0];
        assert_eq!(backdrop.position, FOG_BACKDROP_POSITION);
        assert_eq!(backdrop.size, Vec3::splat(FOG_BACKDROP_SIZE));
        assert_eq!(backdrop.linear_velocity, Vec3::ZERO);
        let drift = &sim.particles()[1];
        assert_eq!(drift.linear_velocity, FOG_DRIFT);
        assert!(drift.position.y >= 15.0 && drift.position.y < 50.0);

        sim.update_state(DT);
        assert_eq!(sim.count(ParticleKind::Fog), 3);
    }

    #[test]
    fn test_fog_has_no_gravity_while_active() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.toggle_fog();
        for _ in 0..10 {
            sim.step(DT);
        }
        assert!(
            sim.particles()
                .iter()
                .all(|p| p.linear_velocity.y == 0.0 || p.linear_velocity == FOG_DRIFT)
        );
    }

    #[test]
    fn test_fog_falls_after_disable() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.toggle_fog();
        sim.update_state(DT);
        let count = sim.len();
        sim.toggle_fog();
        sim.update_state(DT);
        assert_eq!(sim.len(), count);
        assert!(sim.particles().iter().all(|p| p.linear_velocity.y < 1.0));

        for _ in 0..400 {
            sim.step(DT);
        }
        assert!(sim.is_empty(), "{} fog bodies left", sim.len());
    }

    #[test]
    fn test_disabled_kind_simulates_to_completion() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.toggle_rain();
        for _ in 0..10 {
            sim.step(DT);
        }
        assert!(sim.count(ParticleKind::Rain) > 0);
        sim.toggle_snow();
        sim.step(DT);
        assert!(sim.count(ParticleKind::Rain) > 0);
        assert!(sim.count(ParticleKind::Snow) > 0);
        for _ in 0..200 {
            sim.step(DT);
        }
        assert_eq!(sim.count(ParticleKind::Rain), 0);
    }

    #[test]
    fn test_step_returns_alpha_and_counts_ticks() {
        let mut sim = create_sim(WeatherMode::Combined);
        let alpha = sim.step(0.075);
        assert_eq!(sim.stepper().steps_taken(), 1);
        assert!((alpha - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_blended_transforms_cover_pool() {
        let mut sim = create_sim(WeatherMode::Combined);
        sim.toggle_snow();
        sim.step(DT);
        let transforms: Vec<_> = sim.blended_transforms(0.5).collect();
        assert_eq!(transforms.len(), sim.len());
        assert!(transforms.iter().all(|(kind, _)| *kind == ParticleKind::Snow));
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let mut a = create_sim(WeatherMode::Combined);
        let mut b = create_sim(WeatherMode::Combined);
        a.toggle_rain();
        b.toggle_rain();
        for _ in 0..30 {
            a.step(DT);
            b.step(DT);
        }
        assert_eq!(a.len(), b.len());
        let pa: Vec<_> = a.particles().iter().map(|p| p.position).collect();
        let pb: Vec<_> = b.particles().iter().map(|p| p.position).collect();
        assert_eq!(pa, pb);
    }
}
