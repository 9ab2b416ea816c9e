//! Structured logging for the Griffith scene.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds. The filter comes from `RUST_LOG`, then from the
//! config's `debug.log_level`, then from [`DEFAULT_FILTER`].

use griffith_config::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config specify one.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "griffith.log";

/// Pick the filter directive string for the given config.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => {
            // Keep GPU backends quiet unless the level explicitly names them.
            if config.debug.log_level.contains("wgpu") {
                config.debug.log_level.clone()
            } else {
                format!("{},wgpu=warn,naga=warn", config.debug.log_level)
            }
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Opens `<log_dir>/griffith.log` for the JSON layer.
fn open_log_file(log_dir: &Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(log_dir).ok()?;
    std::fs::File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// Install the global subscriber: a console layer always, plus a JSON file
/// layer under `log_dir` when `file_logging` is set and the file can be
/// created. `RUST_LOG` beats the level from `config`.
///
/// ```no_run
/// use griffith_config::Config;
/// use griffith_log::init_logging;
///
/// init_logging(None, false, Some(&Config::default()));
/// ```
pub fn init_logging(log_dir: Option<&Path>, file_logging: bool, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let console = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());
    let file = log_dir
        .filter(|_| file_logging)
        .and_then(open_log_file)
        .map(|log_file| {
            fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_timer(fmt::time::uptime())
                .json()
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();
}

/// `EnvFilter` built from [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
