// Quantizers - Pitch folding, velocity stepping and duration units
// Pure numeric helpers shared by the encoder, decoder and totalizer

use super::config::{DurationSettings, PitchRange, VelocityRange};

/// Length of one duration unit in beats
/// 0.125 of a quarter-note beat is a 32nd note.
pub const NOTE_MULTIPLIER: f64 = 0.125;

/// Seconds covered by one duration unit at `tempo` BPM
pub fn min_duration_seconds(tempo: f64) -> f64 {
    NOTE_MULTIPLIER * 60.0 / tempo
}

/// Fold `pitch` into `range` by whole octaves
///
/// Equivalent to raising by 12 while below `min`, then lowering by 12 while at
/// or above `max`. A window narrower than an octave can leave the result
/// below `min`.
pub fn clamp_pitch(pitch: i32, range: &PitchRange) -> i32 {
    let mut pitch = pitch;
    if pitch < range.min() {
        let octaves = (range.min() - pitch + 11) / 12;
        pitch += octaves * 12;
    }
    if pitch >= range.max() {
        let octaves = (pitch - range.max()) / 12 + 1;
        pitch -= octaves * 12;
    }
    pitch
}

/// Clamp into `[min, max]`, then floor to a multiple of the step
///
/// Not re-clamped afterwards: the result can sit below `min` when `min` is
/// not itself a multiple of the step.
pub fn clamp_velocity(velocity: i32, range: &VelocityRange) -> i32 {
    let velocity = velocity.clamp(range.min(), range.max());
    velocity.div_euclid(range.step()) * range.step()
}

/// Convert a span in seconds to a whole number of duration units
///
/// The span is lengthened by `stretch_percent * stretch` of itself, rounded
/// half-to-even, and capped at `max_duration`. There is no lower bound, so a
/// large negative stretch can produce negative units.
pub fn quantize_duration(
    delta_seconds: f64,
    tempo: f64,
    stretch: i64,
    settings: &DurationSettings,
) -> i64 {
    let min_duration = min_duration_seconds(tempo);
    let stretched = delta_seconds + delta_seconds * settings.stretch_percent * stretch as f64;

    let units = (stretched / min_duration).round_ties_even() as i64;

    units.min(settings.max_duration)
}
