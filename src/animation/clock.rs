use crate::foundation::core::Millis;

/// Length of the fade-in and fade-out phases.
pub const FADE_MS: u64 = 500;

/// Sub-state of showing one display unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    /// Opacity ramps 0 to 1.
    #[default]
    FadeIn,
    /// Fully opaque hold.
    Display,
    /// Opacity ramps 1 to 0.
    FadeOut,
}

/// Output of one [`tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseTick {
    /// Phase after this tick.
    pub phase: Phase,
    /// Start of `phase`.
    pub phase_start: Millis,
    /// Opacity to draw the unit with, in `[0, 1]`.
    pub opacity: f32,
    /// The unit finished fading out; the caller moves to the next one.
    pub advance: bool,
}

/// Hold time for a unit of `char_len` characters: one second per 20 characters, at least one
/// second.
pub fn display_duration_ms(char_len: usize) -> u64 {
    let secs = (char_len as f64 / 20.0).max(1.0);
    (secs * 1000.0).round() as u64
}

/// Advance the phase machine to `now`.
///
/// Pure: everything it depends on is passed in. On `advance` the returned phase is
/// [`Phase::FadeIn`] with `phase_start = now`, ready for the next unit.
pub fn tick(now: Millis, phase_start: Millis, phase: Phase, display_ms: u64) -> PhaseTick {
    let elapsed = now.saturating_since(phase_start);
    let progress = (elapsed as f64 / FADE_MS as f64).clamp(0.0, 1.0) as f32;

    match phase {
        Phase::FadeIn => {
            if elapsed >= FADE_MS {
                PhaseTick {
                    phase: Phase::Display,
                    phase_start: now,
                    opacity: 1.0,
                    advance: false,
                }
            } else {
                PhaseTick {
                    phase,
                    phase_start,
                    opacity: progress,
                    advance: false,
                }
            }
        }
        Phase::Display => PhaseTick {
            phase: if elapsed >= display_ms {
                Phase::FadeOut
            } else {
                Phase::Display
            },
            phase_start: if elapsed >= display_ms { now } else { phase_start },
            opacity: 1.0,
            advance: false,
        },
        Phase::FadeOut => {
            if elapsed >= FADE_MS {
                PhaseTick {
                    phase: Phase::FadeIn,
                    phase_start: now,
                    opacity: 0.0,
                    advance: true,
                }
            } else {
                PhaseTick {
                    phase,
                    phase_start,
                    opacity: 1.0 - progress,
                    advance: false,
                }
            }
        }
    }
}
