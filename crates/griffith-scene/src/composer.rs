//! Static scene authoring: the park, the observatory, the skyline and the sky
//! bodies as plain [`DrawItem`] lists.
//!
//! Geometry that never moves is built once and cached. The city is rebuilt
//! whenever the layout changes; the sky dome, stars and sun/moon depend on the
//! current [`SkyFrame`] and are appended per frame.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Vec3};
use griffith_render::{DrawItem, Material, MeshKind, SceneLighting};
use griffith_sky::{Color, LightDescriptor, SkyFrame};
use griffith_weather::{ParticleKind, WeatherSimulation};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::city::BuildingSite;

/// Courtyard lamp positions on the platform (x, z). Each is also a point light.
pub const COURTYARD_LAMPS: [(f32, f32); 14] = [
    (5.2, 5.2),
    (7.5, 5.2),
    (5.2, -16.2),
    (7.5, -16.2),
    (13.2, -11.2),
    (13.2, 0.2),
    (-0.45, -11.2),
    (-0.45, 0.2),
    (-17.2, -11.2),
    (-17.2, 0.2),
    (-5.2, 5.2),
    (-12.5, 5.2),
    (-5.2, -15.2),
    (-12.5, -15.2),
];

/// Height of the lamp bulbs and of their lights.
pub const LAMP_HEIGHT: f32 = 5.0;
pub const LAMP_LIGHT_COLOR: Color = Color::from_hex(0xfac91a);

pub const SKY_DOME_SCALE: f32 = 500.0;
pub const SKY_BODY_SCALE: f32 = 5.0;
pub const STAR_COUNT: usize = 200;
const STAR_RADIUS: f32 = 480.0;
const STAR_SIZE: f32 = 0.9;

const GRASS: Color = Color::from_hex(0x466d46);
const DARK_GRASS: Color = Color::from_hex(0x2f5128);
const LIGHT_GRASS: Color = Color::from_hex(0x4d7c32);
const PLATFORM_CONCRETE: Color = Color::from_hex(0xdbdbdd);
const TREE_LEAVES: Color = Color::from_hex(0x5aab61);
const TREE_TRUNK: Color = Color::from_hex(0x795c34);
const LAMP_BASE: Color = Color::from_hex(0x989292);
const LAMP_BULB: Color = Color::from_hex(0xbdad07);
const CONCRETE: Color = Color::from_hex(0xc2c0c0);
const DARK_CONCRETE: Color = Color::from_hex(0x868686);
const BALCONY_TOP: Color = Color::from_hex(0xababab);
const DOME: Color = Color::from_hex(0x161c96);
const RAILING: Color = Color::from_hex(0x565656);
const DECORATION: Color = Color::from_hex(0x1e6b61);
const BUILDING: Color = Color::from_hex(0x7d7f85);

const RAIN: Color = Color::from_hex(0x53789e);
const FOG: Color = Color::from_hex(0xd3d3d3).with_alpha(0.2);

fn at(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

fn scaled(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(x, y, z))
}

fn matte(color: Color) -> Material {
    Material::phong(color, 1.0, 1.0, 0.0)
}

/// Builds the draw lists of the scene.
pub struct SceneComposer {
    static_items: Vec<DrawItem>,
    city_items: Vec<DrawItem>,
    stars: Vec<Vec3>,
}

impl SceneComposer {
    /// Author the static scene and scatter the stars from `star_seed`.
    pub fn new(star_seed: u64) -> Self {
        let mut static_items = Vec::new();
        park(&mut static_items);
        courtyard_lamps(&mut static_items);
        trees(&mut static_items);
        observatory(&mut static_items);
        debug!("Authored {} static scene items", static_items.len());

        Self {
            static_items,
            city_items: Vec::new(),
            stars: scatter_stars(star_seed, STAR_COUNT),
        }
    }

    /// Geometry that never changes.
    pub fn static_items(&self) -> &[DrawItem] {
        &self.static_items
    }

    pub fn city_items(&self) -> &[DrawItem] {
        &self.city_items
    }

    pub fn stars(&self) -> &[Vec3] {
        &self.stars
    }

    /// Replace the skyline with one cube per building site.
    pub fn set_city(&mut self, sites: &[BuildingSite]) {
        let material = Material::phong(BUILDING, 0.9, 0.9, 0.1);
        self.city_items = sites
            .iter()
            .map(|site| DrawItem::new(MeshKind::Cube, site.transform(), material))
            .collect();
    }

    /// Every item of the lit scene for this frame, in draw order.
    pub fn compose(&self, sky: &SkyFrame, body_color: Color) -> Vec<DrawItem> {
        let mut items = Vec::with_capacity(
            self.static_items.len() + self.city_items.len() + self.stars.len() + 2,
        );
        items.push(DrawItem::new(
            MeshKind::Sphere,
            Mat4::from_scale(Vec3::splat(SKY_DOME_SCALE)),
            Material::unlit(sky.sky_color),
        ));
        if sky.star_visibility > 0.0 {
            let star = Material::unlit(Color::WHITE.with_alpha(sky.star_visibility.min(1.0)));
            items.extend(self.stars.iter().map(|&p| {
                DrawItem::new(
                    MeshKind::Sphere,
                    Mat4::from_translation(p) * Mat4::from_scale(Vec3::splat(STAR_SIZE)),
                    star,
                )
            }));
        }
        items.push(DrawItem::new(
            MeshKind::Sphere,
            Mat4::from_translation(sky.light_position.truncate())
                * Mat4::from_scale(Vec3::splat(SKY_BODY_SCALE)),
            Material::unlit(body_color),
        ));
        items.extend_from_slice(&self.static_items);
        items.extend_from_slice(&self.city_items);
        items
    }

    /// The sun or moon plus one light per courtyard lamp, sized by the
    /// frame's ambient size.
    pub fn lighting(&self, sky: &SkyFrame, sun: LightDescriptor) -> SceneLighting {
        let mut lights = Vec::with_capacity(COURTYARD_LAMPS.len() + 1);
        lights.push(sun);
        lights.extend(COURTYARD_LAMPS.iter().map(|&(x, z)| {
            LightDescriptor::point(Vec3::new(x, LAMP_HEIGHT, z), LAMP_LIGHT_COLOR, sky.ambient_size)
        }));
        SceneLighting {
            clear_color: sky.sky_color,
            lights,
        }
    }

    /// Interpolated weather particles. None of them cast shadows.
    pub fn weather_items(&self, weather: &WeatherSimulation, alpha: f32) -> Vec<DrawItem> {
        weather
            .blended_transforms(alpha)
            .map(|(kind, transform)| {
                DrawItem::new(MeshKind::Sphere, transform, weather_material(kind))
            })
            .collect()
    }
}

/// Surface of a weather particle.
pub fn weather_material(kind: ParticleKind) -> Material {
    let material = match kind {
        ParticleKind::Rain => Material::phong(RAIN, 0.8, 0.6, 0.0),
        ParticleKind::Snow => Material::phong(Color::WHITE, 1.0, 0.6, 0.0),
        ParticleKind::Fog => Material::phong(FOG, 1.0, 0.0, 0.0),
    };
    material.without_shadow_casting()
}

/// Uniform points on the upper star sphere.
fn scatter_stars(seed: u64, count: usize) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let theta = rng.random::<f32>() * TAU;
            // Upper hemisphere only; stars below the horizon are hidden by the ground.
            let cos_phi = rng.random::<f32>();
            let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
            Vec3::new(sin_phi * theta.cos(), cos_phi, sin_phi * theta.sin()) * STAR_RADIUS
        })
        .collect()
}

fn park(items: &mut Vec<DrawItem>) {
    items.push(DrawItem::new(
        MeshKind::Square,
        at(0.0, -10.0, 0.0) * Mat4::from_rotation_x(FRAC_PI_2) * scaled(1000.0, 1000.0, 1.0),
        matte(GRASS),
    ));
    items.push(DrawItem::new(
        MeshKind::Sphere,
        at(0.0, -10.0, 0.0) * scaled(70.0, 13.0, 70.0),
        matte(DARK_GRASS),
    ));
    items.push(DrawItem::new(
        MeshKind::Cube,
        Mat4::from_rotation_x(FRAC_PI_2) * scaled(20.0, 30.0, 3.0),
        matte(PLATFORM_CONCRETE),
    ));

    let grass = matte(LIGHT_GRASS);
    let patch = at(10.0, 3.05, 0.0) * Mat4::from_rotation_x(FRAC_PI_2) * scaled(3.0, 5.0, 3.0);
    let below = patch * at(0.0, -2.2, 0.0);
    for transform in [
        patch,
        below,
        patch * at(-2.4, 0.0, 0.0),
        below * at(-2.4, 0.0, 0.0),
        patch * at(-6.5, -1.0, 0.0) * scaled(2.5, 2.0, 2.0),
    ] {
        items.push(DrawItem::new(MeshKind::Square, transform, grass));
    }

    let statue = Material::phong(Color::WHITE, 0.5, 0.6, 0.0);
    for (mesh, y, scale) in [
        (MeshKind::Cube, 3.0, Vec3::new(0.5, 0.75, 0.5)),
        (MeshKind::Cube, 4.0, Vec3::new(0.4, 0.8, 0.4)),
        (MeshKind::Cube, 5.0, Vec3::new(0.28, 1.5, 0.28)),
        (MeshKind::Sphere, 6.0, Vec3::new(0.28, 1.5, 0.28)),
    ] {
        items.push(DrawItem::new(
            mesh,
            at(6.4, y, -5.5) * Mat4::from_scale(scale),
            statue,
        ));
    }
}

fn courtyard_lamps(items: &mut Vec<DrawItem>) {
    let base = Material::phong(LAMP_BASE, 0.7, 0.5, 1.0);
    let bulb = Material::phong(LAMP_BULB, 1.0, 1.0, 0.0);
    for &(x, z) in &COURTYARD_LAMPS {
        items.push(DrawItem::new(MeshKind::Cube, at(x, 3.0, z) * scaled(0.15, 0.4, 0.15), base));
        items.push(DrawItem::new(MeshKind::Sphere, at(x, 3.5, z) * scaled(0.13, 0.3, 0.13), base));
        items.push(DrawItem::new(MeshKind::Cube, at(x, 4.0, z) * scaled(0.03, 1.0, 0.03), base));
        items.push(DrawItem::new(
            MeshKind::Sphere,
            at(x, LAMP_HEIGHT, z) * Mat4::from_scale(Vec3::splat(0.16)),
            bulb,
        ));
    }
}

/// Single-crown or double-crown tree rooted at `(x, y, z)`.
fn tree(items: &mut Vec<DrawItem>, x: f32, y: f32, z: f32, double_crown: bool) {
    let leaves = matte(TREE_LEAVES);
    let crown = at(x, y + 5.0, z);
    items.push(DrawItem::new(MeshKind::Sphere, crown, leaves));
    if double_crown {
        items.push(DrawItem::new(
            MeshKind::Sphere,
            crown * at(0.0, 1.4, 0.0) * Mat4::from_scale(Vec3::splat(1.4)),
            leaves,
        ));
    }
    items.push(DrawItem::new(
        MeshKind::Cube,
        crown * scaled(0.1, 1.0, 0.1) * at(0.0, -1.0, 0.0),
        matte(TREE_TRUNK),
    ));
}

fn trees(items: &mut Vec<DrawItem>) {
    const ROW: [(f32, f32, bool); 9] = [
        (-2.4, -16.0, true),
        (-2.2, -13.0, false),
        (-2.0, -10.0, true),
        (-1.8, -7.0, false),
        (-1.5, -4.0, true),
        (-1.6, -1.0, false),
        (-1.8, 2.0, true),
        (-1.9, 5.0, false),
        (-2.0, 8.0, true),
    ];
    for x in [-23.0, 25.0] {
        for &(y, z, double_crown) in &ROW {
            tree(items, x, y, z, double_crown);
        }
    }
    tree(items, -4.0, 0.0, 4.0, true);
    tree(items, 4.0, 0.0, -7.0, true);
    tree(items, 4.0, 0.0, -9.0, false);
}

fn cube(items: &mut Vec<DrawItem>, transform: Mat4, material: Material) {
    items.push(DrawItem::new(MeshKind::Cube, transform, material));
}

fn observatory(items: &mut Vec<DrawItem>) {
    let concrete = Material::phong(CONCRETE, 1.0, 0.9, 0.1);
    let dark = Material::phong(DARK_CONCRETE, 1.0, 0.9, 0.1);
    let balcony_top = Material::phong(BALCONY_TOP, 1.0, 0.9, 0.0);
    let dome = Material::phong(DOME, 1.0, 1.0, 0.5);
    let railing = Material::phong(RAILING, 1.0, 1.0, 0.0);
    let decoration = Material::phong(DECORATION, 1.0, 1.0, 0.5);

    // Drums under the three domes, each with a slightly wider collar.
    let main_drum = at(0.0, 3.0, 25.0) * Mat4::from_rotation_x(FRAC_PI_2) * scaled(6.0, 6.0, 10.0);
    let side_drum = main_drum * scaled(0.4, 0.4, 0.8) * at(6.0, -5.0, 0.0);
    for drum in [main_drum, side_drum, side_drum * at(-12.0, 0.0, 0.0)] {
        items.push(DrawItem::new(MeshKind::Cylinder, drum, dark));
        items.push(DrawItem::new(
            MeshKind::Cylinder,
            drum * scaled(1.1, 1.1, 0.9),
            concrete,
        ));
    }

    // Front walls.
    let left_wall = at(8.0, 6.0, 13.0) * scaled(5.5, 0.5, 2.0);
    let right_wall = left_wall * at(-3.0, 0.0, 0.0);
    for wall in [left_wall, right_wall] {
        cube(items, wall, concrete);
        cube(items, wall * at(0.0, -5.0, 0.0), concrete);
    }

    // Window bays on both wings.
    let mut bays = Vec::new();
    let mut offset = 3.0;
    while offset < 13.0 {
        bays.push((offset, 2.0));
        offset += 2.0;
    }
    let mut offset = -3.5;
    while offset > -14.0 {
        bays.push((offset, -2.0));
        offset -= 2.0;
    }
    for (x, plate_shift) in bays {
        let window = at(x, 4.7, 13.0) * scaled(0.5, 1.0, 2.0);
        cube(items, window, concrete);
        let back_plate = window * at(plate_shift, 0.0, 1.0);
        items.push(DrawItem::new(MeshKind::Square, back_plate, concrete));
        items.push(DrawItem::new(
            MeshKind::Square,
            back_plate * at(0.0, 0.0, -1.0),
            concrete,
        ));
    }

    // Entryway and its steps.
    cube(items, at(2.0, 4.0, 12.0) * scaled(0.5, 2.0, 2.0), dark);
    cube(items, at(-2.5, 4.0, 12.0) * scaled(0.5, 2.0, 2.0), dark);
    cube(items, at(-0.25, 6.25, 12.0) * scaled(3.0, 0.25, 2.0), concrete);
    cube(items, at(-0.25, 3.25, 13.0) * scaled(3.0, 0.45, 2.0), concrete);
    for step in 0..7 {
        let step = step as f32;
        cube(
            items,
            at(-0.25, 3.65 - 0.1 * step, 10.75 - 0.25 * step) * scaled(3.75, 0.08, 2.0),
            dark,
        );
    }

    // Domes.
    let main_dome = at(0.0, 8.0, 25.0)
        * Mat4::from_rotation_x(FRAC_PI_2)
        * Mat4::from_scale(Vec3::splat(5.85));
    let side_dome = main_dome * Mat4::from_scale(Vec3::splat(0.4)) * at(6.15, -5.125, 0.5);
    for transform in [main_dome, side_dome, side_dome * at(-12.3, 0.0, 0.0)] {
        items.push(DrawItem::new(MeshKind::Sphere, transform, dome));
    }
    cube(items, at(8.0, 7.0, 13.0) * scaled(3.5, 0.25, 1.5), dark);
    cube(items, at(-8.0, 7.0, 13.0) * scaled(3.5, 0.25, 1.5), dark);

    // Central body with its rooftop ornament.
    let body = at(0.0, 4.5, 21.0) * Mat4::from_rotation_x(FRAC_PI_2) * scaled(5.0, 6.0, 2.0);
    cube(items, body, concrete);
    let topper = body * at(0.0, -1.0, -1.0) * scaled(0.7, 0.5, 0.25);
    cube(items, topper, concrete);
    let topper_drum = topper * at(0.0, 0.0, -1.5) * scaled(1.0, 1.0, 1.25);
    items.push(DrawItem::new(MeshKind::Cylinder, topper_drum, decoration));
    items.push(DrawItem::new(
        MeshKind::Sphere,
        topper_drum * scaled(0.8, 0.8, 2.0),
        decoration,
    ));

    // Front colonnades and their lintels.
    for x in [5.0, 7.0, 9.0, 11.0, -5.5, -7.5, -9.5, -11.5] {
        cube(items, at(x, 4.3, 11.7) * scaled(0.4, 2.0, 1.0), dark);
    }
    cube(items, at(8.0, 6.5, 10.9) * scaled(5.0, 0.3, 0.15), dark);
    cube(items, at(-8.5, 6.5, 10.9) * scaled(5.0, 0.3, 0.15), dark);

    // Back balconies, the curved stairs leading up to them, and their railings.
    for side in [1.0_f32, -1.0] {
        cube(items, at(9.5 * side, 4.1, 20.0) * scaled(4.5, 1.0, 5.0), concrete);
        cube(items, at(10.0 * side, 4.2, 20.0) * scaled(3.9, 1.0, 4.5), balcony_top);

        for step in 0..20 {
            let step = step as f32;
            let position = Vec3::new(
                side * (17.5 - 0.35 * step),
                3.1 + 0.1 * step,
                13.0 + 0.25 * step,
            );
            cube(
                items,
                Mat4::from_translation(position)
                    * scaled(1.3 + 0.2 * step, 0.08, 2.0)
                    * Mat4::from_rotation_y(-0.1 * step * side),
                dark,
            );
        }

        cube(items, at(9.5 * side, 6.1, 24.5) * scaled(4.0, 0.1, 0.1), railing);
        cube(items, at(13.5 * side, 6.1, 22.5) * scaled(0.1, 0.1, 2.0), railing);
        cube(items, at(13.5 * side, 5.7, 20.5) * scaled(0.1, 0.5, 0.1), railing);
        cube(items, at(13.5 * side, 5.7, 24.5) * scaled(0.1, 0.5, 0.1), railing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use griffith_sky::{DayNightCycle, MOON_BODY_COLOR, SUN_BODY_COLOR};
    use griffith_weather::{FixedStepper, WeatherMode};

    fn day() -> SkyFrame {
        DayNightCycle::default().last_frame()
    }

    fn night() -> SkyFrame {
        SkyFrame {
            light_position: Vec4::new(10.0, 150.0, 300.0, 1.0),
            light_radius: 0.0,
            sky_color: Color::rgb(0.08, 0.24, 0.39),
            ambient_size: 9.0,
            star_visibility: 1.0,
            is_daytime: false,
        }
    }

    fn sun(frame: &SkyFrame) -> LightDescriptor {
        LightDescriptor::point(frame.light_position.truncate(), Color::WHITE, frame.light_radius)
    }

    #[test]
    fn test_static_scene_is_deterministic_and_finite() {
        let a = SceneComposer::new(1);
        let b = SceneComposer::new(1);
        assert_eq!(a.static_items(), b.static_items());
        assert!(a.static_items().len() > 100);
        for item in a.static_items() {
            assert!(item.transform.is_finite());
            assert!(item.material.casts_shadows);
        }
    }

    #[test]
    fn test_lamps_present_with_bulbs() {
        let composer = SceneComposer::new(1);
        let bulb = Material::phong(LAMP_BULB, 1.0, 1.0, 0.0);
        let bulbs: Vec<_> = composer
            .static_items()
            .iter()
            .filter(|item| item.material == bulb)
            .collect();
        assert_eq!(bulbs.len(), COURTYARD_LAMPS.len());
        assert!(bulbs.iter().all(|b| (b.transform.w_axis.y - LAMP_HEIGHT).abs() < 1e-6));
    }

    #[test]
    fn test_city_items_follow_layout() {
        let mut composer = SceneComposer::new(1);
        let sites = [
            BuildingSite {
                x: 0.0,
                z: 150.0,
                height_tier: 0,
            },
            BuildingSite {
                x: 40.0,
                z: 200.0,
                height_tier: 2,
            },
        ];
        composer.set_city(&sites);
        assert_eq!(composer.city_items().len(), 2);
        assert_eq!(composer.city_items()[1].transform, sites[1].transform());

        composer.set_city(&sites[..1]);
        let composed = composer.compose(&day(), SUN_BODY_COLOR);
        assert_eq!(
            composed.len(),
            composer.static_items().len() + 1 + 2,
            "dome, sun, static items and one building"
        );
    }

    #[test]
    fn test_sky_bodies_are_unlit_and_not_casting() {
        let composer = SceneComposer::new(1);
        let frame = day();
        let items = composer.compose(&frame, SUN_BODY_COLOR);

        let dome = &items[0];
        assert_eq!(dome.material.color, frame.sky_color);
        assert!(dome.material.unlit && !dome.material.casts_shadows);

        let body = &items[1];
        assert_eq!(body.mesh, MeshKind::Sphere);
        assert_eq!(body.material.color, SUN_BODY_COLOR);
        assert!(!body.material.casts_shadows);
        assert_eq!(body.transform.w_axis, frame.light_position);
    }

    #[test]
    fn test_stars_only_at_night() {
        let composer = SceneComposer::new(3);
        let by_day = composer.compose(&day(), SUN_BODY_COLOR);
        let by_night = composer.compose(&night(), MOON_BODY_COLOR);
        assert_eq!(by_night.len() - by_day.len(), STAR_COUNT);
        assert!(
            composer
                .stars()
                .iter()
                .all(|s| s.y >= 0.0 && (s.length() - STAR_RADIUS).abs() < 1e-2)
        );
    }

    #[test]
    fn test_lamp_lights_follow_ambient_size() {
        let composer = SceneComposer::new(1);
        let frame = night();
        let lighting = composer.lighting(&frame, sun(&frame));
        assert_eq!(lighting.lights.len(), COURTYARD_LAMPS.len() + 1);
        assert_eq!(lighting.clear_color, frame.sky_color);
        assert!(
            lighting.lights[1..]
                .iter()
                .all(|l| l.attenuation_or_size == 9.0 && l.color == LAMP_LIGHT_COLOR)
        );

        let frame = day();
        let lighting = composer.lighting(&frame, sun(&frame));
        assert!(lighting.lights[1..].iter().all(|l| l.attenuation_or_size == 0.0));
    }

    #[test]
    fn test_weather_items_do_not_cast_shadows() {
        let composer = SceneComposer::new(1);
        let mut weather = WeatherSimulation::new(WeatherMode::Combined, FixedStepper::default(), 7);
        weather.toggle_rain();
        weather.step(0.05);
        let items = composer.weather_items(&weather, 0.5);
        assert_eq!(items.len(), weather.len());
        assert!(!items.is_empty());
        assert!(items.iter().all(|i| !i.material.casts_shadows));
        assert!(ParticleKind::ALL.iter().all(|&k| !weather_material(k).casts_shadows));
    }
}
