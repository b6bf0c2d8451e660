// Token Decoder - Token stream back to notes
// Register machine over Advance/Duration/Velocity/Onset, plus the duration totalizer

use super::config::validate_tempo;
use super::error::{CodecError, CodecResult};
use super::quantize::min_duration_seconds;
use super::timeline::Note;
use super::token::{split_variants, Token};

/// Duration register value before any `Duration` token
pub const DEFAULT_DURATION: i64 = 8;

/// Velocity register value before any `Velocity` token
pub const DEFAULT_VELOCITY: i32 = 100;

/// Decoder registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderState {
    /// Position in duration units
    pub playhead: i64,
    pub duration: i64,
    pub velocity: i32,
}

impl Default for DecoderState {
    fn default() -> Self {
        DecoderState {
            playhead: 0,
            duration: DEFAULT_DURATION,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

impl DecoderState {
    /// Apply the token at `position`; an `Onset` yields the note it plays
    ///
    /// `EndOfSequence` leaves every register untouched. Fails when the
    /// playhead or a note end no longer fits in an i64.
    pub fn step(&mut self, position: usize, token: &Token, min_duration: f64) -> CodecResult<Option<Note>> {
        let overflow = || CodecError::DurationOverflow { position };

        match *token {
            Token::Advance => {
                self.playhead = self.playhead.checked_add(self.duration).ok_or_else(overflow)?;
            }
            Token::Duration(duration) => self.duration = duration,
            Token::Velocity(velocity) => self.velocity = velocity,
            Token::Onset(pitch) => {
                let end = self.playhead.checked_add(self.duration).ok_or_else(overflow)?;
                return Ok(Some(Note {
                    pitch,
                    velocity: self.velocity,
                    start: self.playhead as f64 * min_duration,
                    end: end as f64 * min_duration,
                }));
            }
            Token::EndOfSequence => {}
        }

        Ok(None)
    }
}

/// Reconstruct notes from a token stream at `tempo` BPM
///
/// Notes come out in emission order and are neither sorted nor filtered, so
/// a negative `Duration` yields notes that end before they start. Variant
/// markers do not reset state; use `decode_variants` for that.
pub fn decode(tokens: &[Token], tempo: f64) -> CodecResult<Vec<Note>> {
    validate_tempo(tempo)?;
    decode_from(tokens, 0, min_duration_seconds(tempo))
}

/// Decode each `EndOfSequence`-delimited variant from fresh registers
pub fn decode_variants(tokens: &[Token], tempo: f64) -> CodecResult<Vec<Vec<Note>>> {
    validate_tempo(tempo)?;
    let min_duration = min_duration_seconds(tempo);

    let mut offset = 0;
    let mut variants = Vec::new();
    for variant in split_variants(tokens) {
        variants.push(decode_from(variant, offset, min_duration)?);
        // Skip past the marker
        offset += variant.len() + 1;
    }

    Ok(variants)
}

/// Decode from fresh registers; `offset` is the position of `tokens[0]` in
/// the full stream, used for error reporting
fn decode_from(tokens: &[Token], offset: usize, min_duration: f64) -> CodecResult<Vec<Note>> {
    let mut state = DecoderState::default();
    let mut notes = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if let Some(note) = state.step(offset + i, token, min_duration)? {
            notes.push(note);
        }
    }

    Ok(notes)
}

/// Elapsed time in seconds covered by a token stream
///
/// Only `Advance` and `Duration` are read. The duration register starts at
/// zero here, so advances before the first `Duration` add nothing.
pub fn total_duration(tokens: &[Token], tempo: f64) -> CodecResult<f64> {
    validate_tempo(tempo)?;

    let (_, total) = tokens
        .iter()
        .enumerate()
        .try_fold((0i64, 0i64), |(duration, total), (position, token)| match *token {
            Token::Advance => total
                .checked_add(duration)
                .map(|total| (duration, total))
                .ok_or(CodecError::DurationOverflow { position }),
            Token::Duration(d) => Ok((d, total)),
            _ => Ok((duration, total)),
        })?;

    Ok(total as f64 * min_duration_seconds(tempo))
}
