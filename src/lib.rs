// midi-text - Quantized text tokens for MIDI performances
// Module declarations

pub mod codec;
pub mod corpus;
pub mod midi;

pub use codec::{
    decode, decode_variants, encode, encode_notes, parse_tokens, tokens_to_text, total_duration,
    CodecConfig, CodecError, Note, Timeline, Token,
};
