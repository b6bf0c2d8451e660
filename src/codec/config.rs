// Codec configuration
// Pitch/velocity ranges, tick rate, tempo and augmentation spans

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

use super::error::{CodecError, CodecResult};

/// Half-open MIDI pitch window `[min, max)` that transposed pitches are folded into
///
/// Constructing one with `max <= min` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct PitchRange {
    min: i32,
    max: i32,
}

impl PitchRange {
    pub fn new(min: i32, max: i32) -> CodecResult<Self> {
        if max <= min {
            return Err(CodecError::Configuration(format!(
                "pitch range [{}, {}) is empty",
                min, max
            )));
        }
        Ok(PitchRange { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }
}

impl Default for PitchRange {
    fn default() -> Self {
        PitchRange { min: 30, max: 96 }
    }
}

impl TryFrom<(i32, i32)> for PitchRange {
    type Error = CodecError;

    fn try_from((min, max): (i32, i32)) -> CodecResult<Self> {
        PitchRange::new(min, max)
    }
}

impl From<PitchRange> for (i32, i32) {
    fn from(range: PitchRange) -> Self {
        (range.min, range.max)
    }
}

/// Velocity window `[min, max]` plus the quantization step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32, i32)", into = "(i32, i32, i32)")]
pub struct VelocityRange {
    min: i32,
    max: i32,
    step: i32,
}

impl VelocityRange {
    pub fn new(min: i32, max: i32, step: i32) -> CodecResult<Self> {
        if step <= 0 {
            return Err(CodecError::Configuration(format!(
                "velocity step must be positive, got {}",
                step
            )));
        }
        if max < min {
            return Err(CodecError::Configuration(format!(
                "velocity range [{}, {}] is empty",
                min, max
            )));
        }
        Ok(VelocityRange { min, max, step })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn step(&self) -> i32 {
        self.step
    }
}

impl Default for VelocityRange {
    fn default() -> Self {
        VelocityRange {
            min: 32,
            max: 127,
            step: 4,
        }
    }
}

impl TryFrom<(i32, i32, i32)> for VelocityRange {
    type Error = CodecError;

    fn try_from((min, max, step): (i32, i32, i32)) -> CodecResult<Self> {
        VelocityRange::new(min, max, step)
    }
}

impl From<VelocityRange> for (i32, i32, i32) {
    fn from(range: VelocityRange) -> Self {
        (range.min, range.max, range.step)
    }
}

/// Limits applied when turning a time span into duration units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationSettings {
    /// Upper bound on any quantized duration, in duration units
    pub max_duration: i64,

    /// Fraction of a span added per step of time stretch
    /// 0.15 with stretch 1 lengthens every span by 15%
    pub stretch_percent: f64,
}

impl Default for DurationSettings {
    fn default() -> Self {
        DurationSettings {
            max_duration: 56,
            stretch_percent: 0.15,
        }
    }
}

/// Augmentation spans for transposition, time stretch and velocity stretch
///
/// A span of `n` expands to the `n` consecutive offsets
/// `floor(-n/2) + 1 .. floor(n/2) + 1`, so a span of 1 means "offset 0 only"
/// and a span of 0 produces no variants at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Augmentation {
    pub transpose: u32,
    pub time_stretch: u32,
    pub velocity_stretch: u32,
}

impl Augmentation {
    pub fn new(transpose: u32, time_stretch: u32, velocity_stretch: u32) -> Self {
        Augmentation {
            transpose,
            time_stretch,
            velocity_stretch,
        }
    }

    /// Single variant with every offset at zero
    pub fn none() -> Self {
        Augmentation::new(1, 1, 1)
    }

    /// Number of variants `variants()` yields
    pub fn variant_count(&self) -> usize {
        self.transpose as usize * self.time_stretch as usize * self.velocity_stretch as usize
    }

    /// Cartesian product of the three offset ranges
    /// Transpose varies slowest, velocity stretch fastest.
    pub fn variants(&self) -> Vec<Variant> {
        let mut variants = Vec::with_capacity(self.variant_count());
        for transpose in span_offsets(self.transpose) {
            for stretch in span_offsets(self.time_stretch) {
                for velocity in span_offsets(self.velocity_stretch) {
                    variants.push(Variant {
                        transpose: transpose as i32,
                        stretch,
                        velocity: velocity as i32,
                    });
                }
            }
        }
        variants
    }
}

impl Default for Augmentation {
    fn default() -> Self {
        Augmentation::none()
    }
}

/// One combination of augmentation offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    /// Semitones added to every pitch before folding
    pub transpose: i32,

    /// Time stretch factor fed to the duration quantizer
    pub stretch: i64,

    /// Velocity offset, in units of `8 * velocity step`
    pub velocity: i32,
}

impl Variant {
    pub fn identity() -> Self {
        Variant {
            transpose: 0,
            stretch: 0,
            velocity: 0,
        }
    }
}

fn span_offsets(span: u32) -> Range<i64> {
    let span = span as i64;
    (-span).div_euclid(2) + 1..span.div_euclid(2) + 1
}

/// Complete encoder/decoder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub pitch_range: PitchRange,
    pub velocity_range: VelocityRange,

    /// Ticks per second used to discretize onsets and note lengths
    pub fs: f64,

    /// Beats per minute; sets the length of one duration unit
    pub tempo: f64,

    pub augmentation: Augmentation,
    pub duration: DurationSettings,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            pitch_range: PitchRange::default(),
            velocity_range: VelocityRange::default(),
            fs: 1000.0,
            tempo: 120.0,
            augmentation: Augmentation::default(),
            duration: DurationSettings::default(),
        }
    }
}

impl CodecConfig {
    /// Reject tick rates and tempos that would divide by zero or go backwards
    pub fn validate(&self) -> CodecResult<()> {
        validate_tempo(self.tempo)?;
        if !(self.fs.is_finite() && self.fs > 0.0) {
            return Err(CodecError::Configuration(format!(
                "tick rate must be positive, got {}",
                self.fs
            )));
        }
        Ok(())
    }

    /// Read a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)?;
        let config: CodecConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

pub(crate) fn validate_tempo(tempo: f64) -> CodecResult<()> {
    if tempo.is_finite() && tempo > 0.0 {
        Ok(())
    } else {
        Err(CodecError::Configuration(format!(
            "tempo must be positive, got {}",
            tempo
        )))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] CodecError),
}
