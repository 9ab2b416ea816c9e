//! Frame clock feeding the scene its per-frame delta.
//!
//! The wall clock measures real elapsed time; the fixed clock hands out the
//! same delta every frame so scripted and headless runs are reproducible.

use std::time::Instant;

use tracing::warn;

/// Longest delta the wall clock reports. Longer stalls are clamped and the
/// scene simply runs slower for that frame.
pub const MAX_FRAME_DELTA: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
enum ClockSource {
    Wall { previous: Instant },
    Fixed { dt: f32 },
}

/// Produces one delta per frame and tracks total elapsed time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: ClockSource,
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Clock measuring real time from now.
    pub fn wall() -> Self {
        Self::with_source(ClockSource::Wall {
            previous: Instant::now(),
        })
    }

    /// Clock that advances exactly `dt` seconds per frame. Negative or
    /// non-finite values become zero.
    pub fn fixed(dt: f32) -> Self {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        Self::with_source(ClockSource::Fixed { dt })
    }

    fn with_source(source: ClockSource) -> Self {
        Self {
            source,
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Delta of the next frame, in seconds.
    pub fn tick(&mut self) -> f32 {
        let dt = match &mut self.source {
            ClockSource::Fixed { dt } => *dt,
            ClockSource::Wall { previous } => {
                let now = Instant::now();
                let measured = now.duration_since(*previous).as_secs_f32();
                *previous = now;
                if measured > MAX_FRAME_DELTA {
                    warn!(
                        "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                        measured * 1000.0,
                        MAX_FRAME_DELTA * 1000.0
                    );
                    MAX_FRAME_DELTA
                } else {
                    measured
                }
            }
        };
        self.elapsed += f64::from(dt);
        self.frame_count += 1;
        dt
    }

    /// Seconds handed out so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.source, ClockSource::Fixed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_exact() {
        let mut clock = FrameClock::fixed(0.25);
        for _ in 0..8 {
            assert_eq!(clock.tick(), 0.25);
        }
        assert_eq!(clock.elapsed(), 2.0);
        assert_eq!(clock.frame_count(), 8);
        assert!(clock.is_fixed());
    }

    #[test]
    fn test_fixed_clock_rejects_bad_delta() {
        assert_eq!(FrameClock::fixed(-1.0).tick(), 0.0);
        assert_eq!(FrameClock::fixed(f32::NAN).tick(), 0.0);
    }

    #[test]
    fn test_wall_clock_is_bounded() {
        let mut clock = FrameClock::wall();
        let dt = clock.tick();
        assert!((0.0..=MAX_FRAME_DELTA).contains(&dt));
        assert!(!clock.is_fixed());
    }
}
