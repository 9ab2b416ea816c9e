//! The per-frame driver tying sky, shadows, camera, city and weather together.

use griffith_config::{Config, StartWeather};
use griffith_render::{
    FrameStats, SceneRenderer, ShadowError, ShadowPipeline, ShadowSettings, Viewport,
};
use griffith_sky::DayNightCycle;
use griffith_weather::{FixedStepper, WeatherMode, WeatherSimulation};
use tracing::{debug, info, trace, warn};

use crate::camera_director::CameraDirector;
use crate::city::CityLayout;
use crate::composer::SceneComposer;
use crate::controls::{ControlBindings, SceneControl};

/// Largest shadow map requested from a renderer. Every wgpu adapter
/// supports 2D textures of this size.
pub const MAX_SHADOW_RESOLUTION: u32 = 8192;

/// What one call to [`GriffithScene::frame`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub stats: FrameStats,
    pub particles_drawn: usize,
    pub is_daytime: bool,
    /// Interpolation alpha the particles were drawn at.
    pub alpha: f32,
}

/// The running scene. Owns every piece of simulation state.
pub struct GriffithScene {
    sky: DayNightCycle,
    shadows: ShadowPipeline,
    city: CityLayout,
    camera: CameraDirector,
    weather: WeatherSimulation,
    composer: SceneComposer,
    bindings: ControlBindings,
    frames: u64,
}

impl GriffithScene {
    /// Build the scene and allocate the shadow map on `renderer`.
    ///
    /// Fails only when the renderer cannot provide a depth texture.
    pub fn from_config<R: SceneRenderer + ?Sized>(
        renderer: &mut R,
        config: &Config,
    ) -> Result<Self, ShadowError> {
        let resolution = config.shadow.resolution.clamp(1, MAX_SHADOW_RESOLUTION);
        if resolution != config.shadow.resolution {
            warn!(
                "Shadow resolution {} out of range, using {resolution}",
                config.shadow.resolution
            );
        }
        let settings = ShadowSettings {
            resolution,
            fov_degrees: config.shadow.fov_degrees,
            near: config.shadow.near,
            far: config.shadow.far,
        };
        let shadows = ShadowPipeline::new(renderer, settings)?;

        let mode = if config.weather.rain_only {
            WeatherMode::RainOnly
        } else {
            WeatherMode::Combined
        };
        let mut weather = WeatherSimulation::new(
            mode,
            FixedStepper::with_tick_hz(config.weather.tick_hz),
            config.weather.seed,
        );
        match config.weather.start {
            StartWeather::None => {}
            StartWeather::Rain => weather.toggle_rain(),
            StartWeather::Snow => weather.toggle_snow(),
            StartWeather::Fog => weather.toggle_fog(),
        }

        let city = CityLayout::new(&config.city);
        let mut composer = SceneComposer::new(config.city.seed);
        composer.set_city(city.sites());

        info!(
            "Scene ready: {} buildings, {:?} weather, half period {}s",
            city.sites().len(),
            weather.active_kind(),
            config.sky.half_period_seconds.max(1)
        );

        Ok(Self {
            sky: DayNightCycle::new(config.sky.half_period_seconds),
            shadows,
            city,
            camera: CameraDirector::new(&config.camera),
            weather,
            composer,
            bindings: ControlBindings::from_config(&config.input),
            frames: 0,
        })
    }

    pub fn sky(&self) -> &DayNightCycle {
        &self.sky
    }

    pub fn shadows(&self) -> &ShadowPipeline {
        &self.shadows
    }

    pub fn city(&self) -> &CityLayout {
        &self.city
    }

    pub fn camera(&self) -> &CameraDirector {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraDirector {
        &mut self.camera
    }

    pub fn weather(&self) -> &WeatherSimulation {
        &self.weather
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    pub fn bindings(&self) -> &ControlBindings {
        &self.bindings
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Look up `key` and apply its control. Returns the control, if bound.
    pub fn handle_key(&mut self, key: &str) -> Option<SceneControl> {
        let control = self.bindings.control_for(key);
        match control {
            Some(control) => self.apply(control),
            None => trace!("Unbound key {key}"),
        }
        control
    }

    pub fn apply(&mut self, control: SceneControl) {
        debug!("Control {control}");
        match control {
            SceneControl::SpeedUpDay => self.sky.speed_up(),
            SceneControl::SlowDownDay => self.sky.slow_down(),
            SceneControl::ToggleCamera => self.camera.toggle_mode(),
            SceneControl::ResetCamera => self.camera.reset(),
            SceneControl::RespawnBuildings => {
                let result = self.city.respawn();
                self.refresh_city(result.is_ok());
            }
            SceneControl::MoreBuildings => {
                let result = self.city.increase();
                self.refresh_city(result.is_ok());
            }
            SceneControl::FewerBuildings => {
                let result = self.city.decrease();
                self.refresh_city(result.is_ok());
            }
            SceneControl::ToggleRain => self.weather.toggle_rain(),
            SceneControl::ToggleSnow => self.weather.toggle_snow(),
            SceneControl::ToggleFog => self.weather.toggle_fog(),
            SceneControl::SpeedUpWeather => self.weather.speed_up(),
            SceneControl::SlowDownWeather => self.weather.slow_down(),
        }
    }

    // A failed placement keeps the old layout, so there is nothing to rebuild.
    fn refresh_city(&mut self, changed: bool) {
        if changed {
            self.composer.set_city(self.city.sites());
        }
    }

    /// Render one frame `dt` seconds after the previous one.
    ///
    /// The sky advances first and places the light; the depth pass and the
    /// shaded camera pass follow. The camera and the weather then advance,
    /// and the interpolated particles are drawn into the still-bound canvas.
    pub fn frame<R: SceneRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        dt: f32,
    ) -> Result<FrameReport, ShadowError> {
        let sky = self.sky.advance(dt);
        let items = self.composer.compose(&sky, self.sky.body_color());
        let lighting = self.composer.lighting(&sky, self.sky.light());

        self.shadows.compute_light_transform(sky.light_position)?;
        let shadow_casters = self.shadows.render_depth_pass(renderer, &items)?;

        let (width, height) = renderer.canvas_size();
        let camera = self.camera.camera_view(Viewport::full(width, height).aspect());
        let mut pass =
            self.shadows
                .render_camera_pass(renderer, &items, &camera, &lighting, sky.is_daytime)?;

        self.camera.update(dt);
        let alpha = self.weather.step(dt);
        let particles = self.composer.weather_items(&self.weather, alpha);
        pass.draw_items(&particles)?;
        let camera_draws = pass.finish()?;

        self.frames += 1;
        trace!(
            "Frame {}: {shadow_casters} casters, {camera_draws} draws, {} particles",
            self.frames,
            particles.len()
        );
        Ok(FrameReport {
            stats: FrameStats {
                shadow_casters,
                camera_draws,
            },
            particles_drawn: particles.len(),
            is_daytime: sky.is_daytime,
            alpha,
        })
    }
}
