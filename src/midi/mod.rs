// MIDI boundary - Standard MIDI File import and export
// Feeds parsed notes to the codec and writes decoded notes back out

pub mod reader;
pub mod writer;

use thiserror::Error;

use crate::codec::CodecError;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Failed to parse MIDI: {0}")]
    ParseError(#[from] midly::Error),

    #[error("Unsupported MIDI timing: {0}")]
    UnsupportedTiming(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub use reader::{parse_notes, read_midi_file};
pub use writer::{export_midi, write_midi_file, MidiExportOptions};
