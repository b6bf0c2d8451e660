// Corpus tools - Directory encoding, vocabulary and dataset preparation
// Everything between a folder of MIDI files and a train/test text split

pub mod dataset;
pub mod loader;
pub mod vocab;

use thiserror::Error;

use crate::codec::CodecError;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub use dataset::{prepare_dataset, prepare_sequences, truncate_sequence, DatasetSettings, DatasetSplit};
pub use loader::{encode_file, load_dir, Corpus, EncodedFile};
pub use vocab::Vocabulary;
