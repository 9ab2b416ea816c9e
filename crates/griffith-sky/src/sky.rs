//! Sky tint bands and the sine-eased crossfades between them.

use crate::light::Color;

/// Daytime sky.
pub const DAY_BLUE: Color = Color::rgb(0.59, 0.76, 0.94);
/// Night sky.
pub const NIGHT_NAVY: Color = Color::rgb(0.08, 0.24, 0.39);
/// Slightly lighter navy reached just before sunrise.
pub const PRE_DAWN_NAVY: Color = Color::rgb(0.14, 0.32, 0.50);

/// Where the cycle sits relative to sunset and sunrise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkyBand {
    /// Around the day→night toggle.
    Sunset,
    /// Just after the cycle restarts.
    PostSunrise,
    /// Just before the cycle restarts.
    PreSunrise,
    /// Solid day or night.
    #[default]
    Steady,
}

impl SkyBand {
    /// Classify a cycle position. Bands are tested in priority order:
    /// sunset, post-sunrise, pre-sunrise, steady.
    pub fn classify(cycle_elapsed: f32, half_period: f32, window: f32) -> SkyBand {
        if cycle_elapsed >= half_period - window / 2.0 && cycle_elapsed <= half_period + 2.0 * window
        {
            SkyBand::Sunset
        } else if cycle_elapsed < window {
            SkyBand::PostSunrise
        } else if cycle_elapsed > 2.0 * half_period - window / 3.0 {
            SkyBand::PreSunrise
        } else {
            SkyBand::Steady
        }
    }

    /// Pacing of the band's ease, as a multiple of the transition window.
    pub fn pacing_windows(self) -> f32 {
        match self {
            SkyBand::Sunset => 5.0,
            SkyBand::PostSunrise | SkyBand::PreSunrise => 2.0,
            SkyBand::Steady => 1.0,
        }
    }

    /// Elapsed time (in windows) after which the band holds its end color.
    pub fn clamp_windows(self) -> f32 {
        match self {
            SkyBand::Sunset => 2.5,
            SkyBand::PostSunrise | SkyBand::PreSunrise => 1.0,
            SkyBand::Steady => 0.0,
        }
    }

    /// Start and end color of the band's crossfade.
    pub fn endpoints(self, is_daytime: bool) -> (Color, Color) {
        match self {
            SkyBand::Sunset => (DAY_BLUE, NIGHT_NAVY),
            SkyBand::PostSunrise => (NIGHT_NAVY, DAY_BLUE),
            SkyBand::PreSunrise => (NIGHT_NAVY, PRE_DAWN_NAVY),
            SkyBand::Steady => {
                let solid = if is_daytime { DAY_BLUE } else { NIGHT_NAVY };
                (solid, solid)
            }
        }
    }

    /// Sky color `transition_elapsed` seconds into this band.
    pub fn color(self, transition_elapsed: f32, window: f32, is_daytime: bool) -> Color {
        let (from, to) = self.endpoints(is_daytime);
        if self == SkyBand::Steady || transition_elapsed >= self.clamp_windows() * window {
            return to;
        }
        from.mix(to, sine_ease(transition_elapsed, self.pacing_windows() * window))
    }
}

/// `sin(π/2 · t / duration)`, clamped to `[0, 1]`.
pub fn sine_ease(t: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    let progress = (t / duration).clamp(0.0, 1.0);
    (progress * std::f32::consts::FRAC_PI_2).sin()
}
