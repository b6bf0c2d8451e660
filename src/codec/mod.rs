// Codec - Quantized text tokens for note performances
// Timeline extraction, augmentation-aware encoding, decoding and duration totals

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod quantize;
pub mod timeline;
pub mod token;

pub use config::{Augmentation, CodecConfig, ConfigLoadError, DurationSettings, PitchRange, Variant, VelocityRange};
pub use decoder::{decode, decode_variants, total_duration, DecoderState};
pub use encoder::{encode, encode_notes, encode_variant};
pub use error::{CodecError, CodecResult};
pub use quantize::{clamp_pitch, clamp_velocity, min_duration_seconds, quantize_duration, NOTE_MULTIPLIER};
pub use timeline::{Note, NoteEvent, Timeline};
pub use token::{parse_tokens, split_variants, tokens_to_text, Token};
