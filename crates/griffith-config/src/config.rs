//! Scene settings, persisted as `config.ron`. Every section falls back to
//! its defaults when missing so older files keep loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level scene configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Canvas / window settings.
    pub window: WindowConfig,
    /// Day/night cycle settings.
    pub sky: SkyConfig,
    /// Shadow map settings.
    pub shadow: ShadowConfig,
    /// Weather particle settings.
    pub weather: WeatherConfig,
    /// Procedural city settings.
    pub city: CityConfig,
    /// Camera director settings.
    pub camera: CameraConfig,
    /// Key overrides.
    pub input: InputConfig,
    pub debug: DebugConfig,
}

/// Canvas configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    pub title: String,
}

/// Day/night cycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkyConfig {
    /// Seconds for one half-cycle (day or night). Clamped to at least 1.
    pub half_period_seconds: i64,
}

/// Shadow map configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadowConfig {
    /// Depth texture resolution (width = height).
    pub resolution: u32,
    /// Light camera field of view in degrees.
    pub fov_degrees: f32,
    /// Light camera near plane.
    pub near: f32,
    /// Light camera far plane.
    pub far: f32,
}

/// Which weather effect is active at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum StartWeather {
    /// Clear skies.
    #[default]
    None,
    /// Rain.
    Rain,
    /// Snow.
    Snow,
    /// Fog.
    Fog,
}

/// Weather particle simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeatherConfig {
    /// Fixed simulation rate in Hz.
    pub tick_hz: u32,
    /// Weather active at startup.
    pub start: StartWeather,
    /// Use the rain-only variant (single on/off toggle).
    pub rain_only: bool,
    /// RNG seed for particle spawning.
    pub seed: u64,
}

/// Procedural city configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CityConfig {
    /// Number of buildings, clamped to `[1, 75]`.
    pub building_count: u32,
    /// Minimum distance between building centers.
    pub min_separation: f32,
    /// Horizontal placement range along X.
    pub x_range: (f32, f32),
    /// Horizontal placement range along Z.
    pub z_range: (f32, f32),
    /// RNG seed for placement.
    pub seed: u64,
}

/// Camera director configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Start in free-camera mode instead of the scripted orbit.
    pub free_camera: bool,
    /// Orbit radius around the observatory.
    pub orbit_radius: f32,
    /// Orbit angular speed in radians per second.
    pub orbit_speed: f32,
    /// Duration of mode changes and resets, in seconds.
    pub transition_seconds: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

/// Keybinding overrides on top of the built-in map.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Control name to key code, e.g. `"ToggleRain": "KeyR"`.
    pub keybindings: HashMap<String, String>,
}

/// Diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Write JSON logs to the log directory in debug builds.
    pub file_logging: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 600,
            title: "Griffith Observatory".to_string(),
        }
    }
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            half_period_seconds: 10,
        }
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolution: 2048,
            fov_degrees: 130.0,
            near: 0.5,
            far: 500.0,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            tick_hz: 20,
            start: StartWeather::None,
            rain_only: false,
            seed: 7,
        }
    }
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            building_count: 30,
            min_separation: 20.0,
            x_range: (-200.0, 200.0),
            z_range: (100.0, 300.0),
            seed: 42,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            free_camera: false,
            orbit_radius: 45.0,
            orbit_speed: 0.1,
            transition_seconds: 2.0,
            fov_degrees: 45.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            file_logging: false,
        }
    }
}

/// Default config directory: `<platform config dir>/griffith`, or the
/// working directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("griffith"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn read_from(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
    ron::from_str(&text).map_err(ConfigError::ParseError)
}

impl Config {
    /// Read `config.ron` from `config_dir`. A missing file is replaced by the
    /// defaults, which are written back so the user has something to edit.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let defaults = Self::default();
            defaults.save(config_dir)?;
            log::info!("Wrote default settings to {}", path.display());
            return Ok(defaults);
        }
        let config = read_from(&path)?;
        log::info!("Using settings from {}", path.display());
        Ok(config)
    }

    /// Write these settings to `config_dir`, creating the directory if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;
        std::fs::write(config_dir.join(CONFIG_FILE_NAME), text).map_err(ConfigError::WriteError)
    }

    /// Re-read the file on disk. `None` means it still matches `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = read_from(&config_dir.join(CONFIG_FILE_NAME))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Settings changed on disk");
        Ok(Some(fresh))
    }
}
