//! Driver for the Griffith scene binary: the frame clock, scripted input and
//! the run loop shared by the recording and GPU backends.

pub mod clock;
pub mod script;

use griffith_config::Config;
use griffith_render::{SceneRenderer, ShadowError};
use griffith_scene::GriffithScene;
use tracing::{debug, info, warn};

pub use clock::{FrameClock, MAX_FRAME_DELTA};
pub use script::{KeyScript, ScriptError, ScriptedKey};

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub simulated_seconds: f64,
    /// Sunrises plus sunsets seen during the run.
    pub day_night_changes: u32,
    pub last_shadow_casters: usize,
    pub last_camera_draws: usize,
    pub last_particle_count: usize,
}

/// Render `frames` frames of the scene on `renderer`.
pub fn run<R: SceneRenderer + ?Sized>(
    renderer: &mut R,
    config: &Config,
    frames: u64,
    mut clock: FrameClock,
    mut script: KeyScript,
) -> Result<RunSummary, ShadowError> {
    let mut scene = GriffithScene::from_config(renderer, config)?;
    let mut summary = RunSummary::default();
    let mut was_daytime = scene.sky().last_frame().is_daytime;

    for _ in 0..frames {
        let dt = clock.tick();
        for scripted in script.due(clock.elapsed()) {
            match scene.handle_key(&scripted.key) {
                Some(control) => info!("{:.2}s: {} -> {control}", clock.elapsed(), scripted.key),
                None => warn!("Scripted key {} is not bound", scripted.key),
            }
        }

        let report = scene.frame(renderer, dt)?;
        if report.is_daytime != was_daytime {
            summary.day_night_changes += 1;
            was_daytime = report.is_daytime;
            info!(
                "{} at {:.2}s",
                if report.is_daytime { "Sunrise" } else { "Sunset" },
                clock.elapsed()
            );
        }

        summary.frames += 1;
        summary.last_shadow_casters = report.stats.shadow_casters;
        summary.last_camera_draws = report.stats.camera_draws;
        summary.last_particle_count = report.particles_drawn;
        if summary.frames % 100 == 0 {
            debug!(
                "Frame {}: {} draws, {} particles",
                summary.frames, report.stats.camera_draws, report.particles_drawn
            );
        }
    }

    summary.simulated_seconds = clock.elapsed();
    Ok(summary)
}
