//! Procedural city skyline: rejection-sampled building sites.

use glam::{Mat4, Vec3};
use griffith_config::CityConfig;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

/// Candidates tried per building before the layout is declared infeasible.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;
pub const MIN_BUILDINGS: u32 = 1;
pub const MAX_BUILDINGS: u32 = 75;

/// Heights of the three building tiers.
pub const BUILDING_TIER_HEIGHTS: [f32; 3] = [8.0, 14.0, 22.0];
pub const BUILDING_HALF_WIDTH: f32 = 4.0;
/// World height of the ground plane buildings stand on.
pub const GROUND_LEVEL: f32 = -10.0;

/// Errors from building placement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("placed only {placed} of {requested} buildings before giving up")]
    Infeasible { placed: usize, requested: usize },

    #[error("placement range ({0}, {1}) is not finite")]
    InvalidRange(f32, f32),
}

/// Footprint center and height tier of one building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingSite {
    pub x: f32,
    pub z: f32,
    pub height_tier: u8,
}

impl BuildingSite {
    pub fn height(&self) -> f32 {
        BUILDING_TIER_HEIGHTS[usize::from(self.height_tier).min(BUILDING_TIER_HEIGHTS.len() - 1)]
    }

    /// Transform of the unit cube standing on the ground at this site.
    pub fn transform(&self) -> Mat4 {
        let half_height = self.height() / 2.0;
        Mat4::from_translation(Vec3::new(self.x, GROUND_LEVEL + half_height, self.z))
            * Mat4::from_scale(Vec3::new(
                BUILDING_HALF_WIDTH,
                half_height,
                BUILDING_HALF_WIDTH,
            ))
    }

    fn distance_to(&self, other: &BuildingSite) -> f32 {
        ((self.x - other.x).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

fn ordered(range: (f32, f32)) -> Result<(f32, f32), LayoutError> {
    let (a, b) = range;
    if !a.is_finite() || !b.is_finite() {
        return Err(LayoutError::InvalidRange(a, b));
    }
    Ok((a.min(b), a.max(b)))
}

/// Place `count` buildings uniformly in the given ranges, each at least
/// `min_separation` from every other.
pub fn place_buildings<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    min_separation: f32,
    x_range: (f32, f32),
    z_range: (f32, f32),
) -> Result<Vec<BuildingSite>, LayoutError> {
    let (x_min, x_max) = ordered(x_range)?;
    let (z_min, z_max) = ordered(z_range)?;
    let min_separation = min_separation.max(0.0);

    let mut sites: Vec<BuildingSite> = Vec::with_capacity(count);
    while sites.len() < count {
        let mut attempts = 0;
        let site = loop {
            if attempts == MAX_PLACEMENT_ATTEMPTS {
                return Err(LayoutError::Infeasible {
                    placed: sites.len(),
                    requested: count,
                });
            }
            attempts += 1;
            let candidate = BuildingSite {
                x: rng.random_range(x_min..=x_max),
                z: rng.random_range(z_min..=z_max),
                height_tier: rng.random_range(0..BUILDING_TIER_HEIGHTS.len() as u8),
            };
            if sites
                .iter()
                .all(|placed| placed.distance_to(&candidate) >= min_separation)
            {
                break candidate;
            }
        };
        sites.push(site);
    }
    Ok(sites)
}

/// The current city and the parameters it is regenerated from.
pub struct CityLayout {
    sites: Vec<BuildingSite>,
    building_count: u32,
    min_separation: f32,
    x_range: (f32, f32),
    z_range: (f32, f32),
    rng: ChaCha8Rng,
}

impl CityLayout {
    /// Build the initial layout. An infeasible configuration starts with an
    /// empty skyline and a warning.
    pub fn new(config: &CityConfig) -> Self {
        let mut layout = Self::unplaced(config);
        if let Err(e) = layout.place() {
            warn!("Starting with an empty skyline: {e}");
        }
        layout
    }

    /// Like [`CityLayout::new`], but an infeasible configuration is an error.
    pub fn try_new(config: &CityConfig) -> Result<Self, LayoutError> {
        let mut layout = Self::unplaced(config);
        layout.place()?;
        Ok(layout)
    }

    fn unplaced(config: &CityConfig) -> Self {
        let building_count = config.building_count.clamp(MIN_BUILDINGS, MAX_BUILDINGS);
        if building_count != config.building_count {
            warn!(
                "Building count {} clamped to {building_count}",
                config.building_count
            );
        }
        Self {
            sites: Vec::new(),
            building_count,
            min_separation: config.min_separation,
            x_range: config.x_range,
            z_range: config.z_range,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    pub fn sites(&self) -> &[BuildingSite] {
        &self.sites
    }

    pub fn building_count(&self) -> u32 {
        self.building_count
    }

    /// Re-place every building. On failure the previous layout is kept.
    pub fn respawn(&mut self) -> Result<(), LayoutError> {
        self.place()
            .inspect_err(|e| warn!("Keeping previous city layout: {e}"))
    }

    fn place(&mut self) -> Result<(), LayoutError> {
        let sites = place_buildings(
            &mut self.rng,
            self.building_count as usize,
            self.min_separation,
            self.x_range,
            self.z_range,
        )?;
        info!("City layout with {} buildings", sites.len());
        self.sites = sites;
        Ok(())
    }

    /// Change the building count (clamped) and re-place. On failure both the
    /// count and the layout stay as they were.
    pub fn set_building_count(&mut self, count: u32) -> Result<(), LayoutError> {
        let clamped = count.clamp(MIN_BUILDINGS, MAX_BUILDINGS);
        if clamped == self.building_count && self.sites.len() == clamped as usize {
            return Ok(());
        }
        let previous = self.building_count;
        self.building_count = clamped;
        let result = self.respawn();
        if result.is_err() {
            self.building_count = previous;
        }
        result
    }

    pub fn increase(&mut self) -> Result<(), LayoutError> {
        self.set_building_count(self.building_count.saturating_add(1))
    }

    pub fn decrease(&mut self) -> Result<(), LayoutError> {
        self.set_building_count(self.building_count.saturating_sub(1))
    }
}
