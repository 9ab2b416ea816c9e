//! The `griffith` binary: renders the Griffith Observatory scene headlessly,
//! either into a recording renderer or an offscreen wgpu canvas.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use griffith_app::{FrameClock, KeyScript, RunSummary, ScriptedKey, run};
use griffith_config::{CliArgs, Config, ConfigError, default_config_dir};
use griffith_render::{GpuError, GpuSceneRenderer, RecordingRenderer, ShadowError};
use tracing::info;

/// Griffith Observatory park scene.
#[derive(Parser, Debug)]
#[command(name = "griffith", about = "Griffith Observatory park scene")]
struct AppArgs {
    #[command(flatten)]
    scene: CliArgs,

    /// Number of frames to render.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Fixed seconds per frame. Uses the wall clock when omitted.
    #[arg(long)]
    frame_dt: Option<f32>,

    /// Render with wgpu into an offscreen canvas.
    #[arg(long)]
    gpu: bool,

    /// Scripted key presses, e.g. `KeyT@1.5,Equal@3`.
    #[arg(long, value_delimiter = ',')]
    script: Vec<ScriptedKey>,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("GPU initialization failed: {0}")]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Shadow(#[from] ShadowError),
}

fn log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("griffith").join("logs"))
}

fn load_config(args: &CliArgs) -> Result<Config, ConfigError> {
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);
    Ok(config)
}

fn run_app(args: AppArgs) -> Result<RunSummary, AppError> {
    let config = load_config(&args.scene)?;
    griffith_log::init_logging(
        log_dir().as_deref(),
        cfg!(debug_assertions) && config.debug.file_logging,
        Some(&config),
    );

    let clock = match args.frame_dt {
        Some(dt) => FrameClock::fixed(dt),
        None => FrameClock::wall(),
    };
    let script = KeyScript::new(args.script);
    let (width, height) = (config.window.width.max(1), config.window.height.max(1));

    let summary = if args.gpu {
        let mut renderer = GpuSceneRenderer::new(width, height)?;
        info!(
            "Rendering {} frames on {}",
            args.frames,
            renderer.context().adapter.get_info().name
        );
        let summary = run(&mut renderer, &config, args.frames, clock, script)?;
        info!("{} render passes submitted", renderer.passes_submitted());
        summary
    } else {
        let mut renderer = RecordingRenderer::new(width, height);
        info!("Recording {} frames at {width}x{height}", args.frames);
        run(&mut renderer, &config, args.frames, clock, script)?
    };
    Ok(summary)
}

fn main() -> ExitCode {
    let args = AppArgs::parse();
    match run_app(args) {
        Ok(summary) => {
            println!(
                "Rendered {} frames ({:.1}s simulated, {} sunrises/sunsets)",
                summary.frames, summary.simulated_seconds, summary.day_night_changes
            );
            println!(
                "  last frame: {} shadow casters, {} draws, {} particles",
                summary.last_shadow_casters,
                summary.last_camera_draws,
                summary.last_particle_count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("griffith: fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
