//! Settings for the Griffith scene: RON file on disk, command-line overrides
//! on top, and a reload check for edits made while the scene runs.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, WeatherArg};
pub use config::{
    CONFIG_FILE_NAME, CameraConfig, CityConfig, Config, DebugConfig, InputConfig, ShadowConfig,
    SkyConfig, StartWeather, WeatherConfig, WindowConfig, default_config_dir,
};
pub use error::ConfigError;
