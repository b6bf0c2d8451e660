// Token Encoder - Timeline to token stream
// Emits one run-length-suppressed token sequence per augmentation variant

use rayon::prelude::*;

use super::config::{CodecConfig, Variant};
use super::error::CodecResult;
use super::quantize::{clamp_pitch, clamp_velocity, quantize_duration};
use super::timeline::{Note, Timeline};
use super::token::Token;

/// Encode every augmentation variant of `timeline`
///
/// Variants are encoded in parallel and concatenated in the order of
/// `Augmentation::variants`, each closed by `Token::EndOfSequence`.
pub fn encode(timeline: &Timeline, config: &CodecConfig) -> CodecResult<Vec<Token>> {
    config.validate()?;

    let variants = config.augmentation.variants();
    let sequences: Vec<Vec<Token>> = variants
        .par_iter()
        .map(|variant| encode_variant(timeline, config, variant))
        .collect();

    let tokens: Vec<Token> = sequences.into_iter().flatten().collect();

    log::debug!(
        "Encoded {} onsets into {} variants, {} tokens",
        timeline.note_count(),
        variants.len(),
        tokens.len()
    );

    Ok(tokens)
}

/// Extract a timeline at `config.fs` and encode it
pub fn encode_notes(notes: &[Note], config: &CodecConfig) -> CodecResult<Vec<Token>> {
    config.validate()?;
    let timeline = Timeline::from_notes(notes, config.fs);
    encode(&timeline, config)
}

/// Encode a single variant, terminated by `EndOfSequence`
///
/// Duration and velocity tokens are only written when the value differs from
/// the last one written. Notes whose velocity or duration quantize to zero or
/// below are dropped.
pub fn encode_variant(timeline: &Timeline, config: &CodecConfig, variant: &Variant) -> Vec<Token> {
    let mut tokens = Vec::new();

    let mut last_start: i64 = 0;
    let mut last_duration: i64 = 0;
    let mut last_velocity: i32 = 0;

    let velocity_offset = variant.velocity * 8 * config.velocity_range.step();

    for (tick, events) in timeline.iter() {
        let wait = quantize_duration(
            (tick - last_start) as f64 / config.fs,
            config.tempo,
            variant.stretch,
            &config.duration,
        );

        if wait > 0 {
            if wait != last_duration {
                tokens.push(Token::Duration(wait));
                last_duration = wait;
            }
            tokens.push(Token::Advance);
        }

        for event in events {
            let pitch = clamp_pitch(event.pitch + variant.transpose, &config.pitch_range);
            let velocity = clamp_velocity(event.velocity + velocity_offset, &config.velocity_range);
            let duration = quantize_duration(
                event.duration_ticks() as f64 / config.fs,
                config.tempo,
                variant.stretch,
                &config.duration,
            );

            if velocity <= 0 || duration <= 0 {
                continue;
            }

            if velocity != last_velocity {
                tokens.push(Token::Velocity(velocity));
                last_velocity = velocity;
            }

            if duration != last_duration {
                tokens.push(Token::Duration(duration));
                last_duration = duration;
            }

            tokens.push(Token::Onset(pitch));
        }

        last_start = tick;
    }

    tokens.push(Token::EndOfSequence);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::config::{Augmentation, PitchRange, VelocityRange};
    use crate::codec::timeline::NoteEvent;
    use crate::codec::token::{split_variants, tokens_to_text};

    fn event(pitch: i32, velocity: i32, start_tick: i64, length: i64) -> NoteEvent {
        NoteEvent {
            pitch,
            velocity,
            start_tick,
            end_tick: start_tick + length,
        }
    }

    fn timeline_of(events: &[NoteEvent]) -> Timeline {
        let mut timeline = Timeline::new();
        for e in events {
            timeline.insert(*e);
        }
        timeline
    }

    #[test]
    fn test_single_note() {
        // 500 ticks at fs=1000 is one beat at 120 BPM, 8 units
        let timeline = timeline_of(&[event(60, 100, 0, 500)]);
        let tokens = encode(&timeline, &CodecConfig::default()).unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Velocity(100),
                Token::Duration(8),
                Token::Onset(60),
                Token::EndOfSequence,
            ]
        );
        assert_eq!(tokens_to_text(&tokens), "v_100 d_8 n_60 \n");
    }

    #[test]
    fn test_rest_and_register_suppression() {
        let timeline = timeline_of(&[
            event(60, 100, 0, 500),
            event(64, 100, 0, 500),
            event(67, 100, 500, 250),
            event(72, 80, 1000, 250),
        ]);
        let tokens = encode(&timeline, &CodecConfig::default()).unwrap();

        assert_eq!(
            tokens_to_text(&tokens),
            "v_100 d_8 n_60 n_64 a d_4 n_67 d_8 a v_80 d_4 n_72 \n"
        );
    }

    #[test]
    fn test_leading_rest() {
        let timeline = timeline_of(&[event(60, 100, 250, 250)]);
        let tokens = encode(&timeline, &CodecConfig::default()).unwrap();

        assert_eq!(tokens_to_text(&tokens), "d_4 a v_100 n_60 \n");
    }

    #[test]
    fn test_drops_zero_length_notes() {
        // 10 ticks is 0.16 of a unit and rounds to zero
        let timeline = timeline_of(&[event(60, 100, 0, 10), event(62, 100, 0, 500)]);
        let tokens = encode(&timeline, &CodecConfig::default()).unwrap();

        assert_eq!(tokens_to_text(&tokens), "v_100 d_8 n_62 \n");
    }

    #[test]
    fn test_drops_negative_length_notes() {
        let timeline = timeline_of(&[event(60, 100, 100, -50)]);
        let tokens = encode(&timeline, &CodecConfig::default()).unwrap();

        assert_eq!(tokens_to_text(&tokens), "d_2 a \n");
    }

    #[test]
    fn test_drops_zero_velocity() {
        let config = CodecConfig {
            velocity_range: VelocityRange::new(0, 127, 4).unwrap(),
            ..Default::default()
        };
        let timeline = timeline_of(&[event(60, 2, 0, 500)]);
        let tokens = encode(&timeline, &config).unwrap();

        assert_eq!(tokens, vec![Token::EndOfSequence]);
    }

    #[test]
    fn test_pitch_folded_into_range() {
        let timeline = timeline_of(&[event(20, 100, 0, 500), event(100, 100, 0, 500)]);
        let tokens = encode(&timeline, &CodecConfig::default()).unwrap();

        assert_eq!(tokens_to_text(&tokens), "v_100 d_8 n_32 n_88 \n");
    }

    #[test]
    fn test_variant_count() {
        let config = CodecConfig {
            augmentation: Augmentation::new(3, 1, 1),
            ..Default::default()
        };
        let timeline = timeline_of(&[event(60, 100, 0, 500)]);
        let tokens = encode(&timeline, &config).unwrap();

        let markers = tokens.iter().filter(|t| **t == Token::EndOfSequence).count();
        assert_eq!(markers, 3);
        assert_eq!(tokens.last(), Some(&Token::EndOfSequence));

        let onsets: Vec<_> = tokens.iter().filter(|t| t.is_onset()).collect();
        assert_eq!(
            onsets,
            vec![&Token::Onset(59), &Token::Onset(60), &Token::Onset(61)]
        );
    }

    #[test]
    fn test_augmentation_product() {
        let config = CodecConfig {
            augmentation: Augmentation::new(2, 3, 2),
            ..Default::default()
        };
        let timeline = timeline_of(&[event(60, 100, 0, 500), event(62, 90, 1000, 500)]);
        let tokens = encode(&timeline, &config).unwrap();

        assert_eq!(split_variants(&tokens).len(), 12);
    }

    #[test]
    fn test_velocity_stretch_offset() {
        let config = CodecConfig {
            augmentation: Augmentation::new(1, 1, 3),
            ..Default::default()
        };
        let timeline = timeline_of(&[event(60, 80, 0, 500)]);
        let tokens = encode(&timeline, &config).unwrap();

        // Offsets -1, 0, 1 scaled by 8 * step = 32
        assert_eq!(
            tokens_to_text(&tokens),
            "v_48 d_8 n_60 \n v_80 d_8 n_60 \n v_112 d_8 n_60 \n"
        );
    }

    #[test]
    fn test_time_stretch_variant() {
        let timeline = timeline_of(&[event(60, 100, 0, 1000)]);
        let config = CodecConfig::default();

        let stretched = encode_variant(
            &timeline,
            &config,
            &Variant {
                transpose: 0,
                stretch: 1,
                velocity: 0,
            },
        );
        assert_eq!(tokens_to_text(&stretched), "v_100 d_18 n_60 \n");
    }

    #[test]
    fn test_identity_variant_matches_no_augmentation() {
        let timeline = timeline_of(&[event(60, 100, 0, 500), event(50, 70, 750, 300)]);
        let config = CodecConfig::default();

        assert_eq!(
            encode_variant(&timeline, &config, &Variant::identity()),
            encode(&timeline, &config).unwrap()
        );
    }

    #[test]
    fn test_each_variant_resets_registers() {
        let config = CodecConfig {
            augmentation: Augmentation::new(2, 1, 1),
            ..Default::default()
        };
        let timeline = timeline_of(&[event(60, 100, 0, 500)]);
        let tokens = encode(&timeline, &config).unwrap();

        assert_eq!(tokens_to_text(&tokens), "v_100 d_8 n_60 \n v_100 d_8 n_61 \n");
    }

    #[test]
    fn test_narrow_pitch_range_still_terminates() {
        let config = CodecConfig {
            pitch_range: PitchRange::new(60, 61).unwrap(),
            ..Default::default()
        };
        let timeline = timeline_of(&[event(75, 100, 0, 500)]);
        let tokens = encode(&timeline, &config).unwrap();

        assert_eq!(tokens_to_text(&tokens), "v_100 d_8 n_51 \n");
    }

    #[test]
    fn test_empty_timeline() {
        let tokens = encode(&Timeline::new(), &CodecConfig::default()).unwrap();
        assert_eq!(tokens, vec![Token::EndOfSequence]);
    }

    #[test]
    fn test_invalid_tempo_rejected() {
        let config = CodecConfig {
            tempo: -1.0,
            ..Default::default()
        };
        assert!(encode(&Timeline::new(), &config).is_err());
    }

    #[test]
    fn test_encode_notes() {
        let notes = vec![Note::new(60, 100, 0.0, 0.5), Note::new(62, 100, 0.5, 1.0)];
        let tokens = encode_notes(&notes, &CodecConfig::default()).unwrap();

        assert_eq!(tokens_to_text(&tokens), "v_100 d_8 n_60 a n_62 \n");
    }

    #[test]
    fn test_deterministic() {
        let config = CodecConfig {
            augmentation: Augmentation::new(3, 3, 3),
            ..Default::default()
        };
        let timeline = timeline_of(&[
            event(60, 100, 0, 500),
            event(48, 70, 130, 900),
            event(72, 110, 777, 55),
        ]);

        let first = encode(&timeline, &config).unwrap();
        let second = encode(&timeline, &config).unwrap();
        assert_eq!(first, second);
    }
}
