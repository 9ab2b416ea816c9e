use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::Config;
use crate::config::StartWeather;

/// Weather selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WeatherArg {
    None,
    Rain,
    Snow,
    Fog,
}

impl From<WeatherArg> for StartWeather {
    fn from(arg: WeatherArg) -> Self {
        match arg {
            WeatherArg::None => StartWeather::None,
            WeatherArg::Rain => StartWeather::Rain,
            WeatherArg::Snow => StartWeather::Snow,
            WeatherArg::Fog => StartWeather::Fog,
        }
    }
}

/// Scene flags. Any flag given wins over the value in `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "griffith", about = "Griffith Observatory park scene")]
pub struct CliArgs {
    /// Canvas width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Seconds per day (and per night).
    #[arg(long)]
    pub half_period: Option<i64>,

    /// Number of city buildings.
    #[arg(long)]
    pub buildings: Option<u32>,

    /// Weather active at startup.
    #[arg(long, value_enum)]
    pub weather: Option<WeatherArg>,

    /// Use the rain-only weather variant.
    #[arg(long)]
    pub rain_only: Option<bool>,

    /// Shadow map resolution.
    #[arg(long)]
    pub shadow_resolution: Option<u32>,

    /// Seed for city placement and particle spawning.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Filter directive for the log output, e.g. `debug` or `griffith_weather=trace`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory holding `config.ron`.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Overwrite the fields named by `args`. A `--seed` seeds both the city
    /// layout and the weather spawner.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(width) = args.width {
            self.window.width = width;
        }
        if let Some(height) = args.height {
            self.window.height = height;
        }
        if let Some(period) = args.half_period {
            self.sky.half_period_seconds = period;
        }
        if let Some(count) = args.buildings {
            self.city.building_count = count;
        }
        if let Some(weather) = args.weather {
            self.weather.start = weather.into();
        }
        if let Some(rain_only) = args.rain_only {
            self.weather.rain_only = rain_only;
        }
        if let Some(resolution) = args.shadow_resolution {
            self.shadow.resolution = resolution;
        }
        if let Some(seed) = args.seed {
            self.city.seed = seed;
            self.weather.seed = seed;
        }
        if let Some(level) = &args.log_level {
            self.debug.log_level.clone_from(level);
        }
    }
}
