// Corpus loading - Encode every MIDI file under a directory
// Caches each file's token text next to it as `<stem>.txt`

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::vocab::Vocabulary;
use super::CorpusError;
use crate::codec::{encode_notes, tokens_to_text, CodecConfig};
use crate::midi::read_midi_file;

/// File extensions recognized as MIDI, compared case-insensitively
pub const MIDI_EXTENSIONS: [&str; 2] = ["mid", "midi"];

/// One encoded MIDI file
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFile {
    pub path: PathBuf,

    /// Rendered token text, every variant included
    pub text: String,
}

/// Result of walking a corpus directory
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Files that produced non-empty text, in path order
    pub files: Vec<EncodedFile>,
    pub vocabulary: Vocabulary,
}

impl Corpus {
    /// All file texts, one after another
    pub fn text(&self) -> String {
        self.files.iter().map(|file| file.text.as_str()).collect()
    }
}

pub fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MIDI_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
        .unwrap_or(false)
}

/// Token cache path for a MIDI file: same stem, `.txt` extension
pub fn cache_path(path: &Path) -> PathBuf {
    path.with_extension("txt")
}

/// Encode one MIDI file, reusing its `.txt` cache when present
///
/// Non-MIDI paths and files that fail to parse yield an empty string. A
/// freshly encoded file has its text written to the cache.
pub fn encode_file(path: &Path, config: &CodecConfig) -> Result<String, CorpusError> {
    if !is_midi_file(path) {
        return Ok(String::new());
    }

    let cache = cache_path(path);
    if cache.is_file() {
        log::debug!("Using cached tokens for {}", path.display());
        return Ok(fs::read_to_string(&cache)?);
    }

    log::info!("Encoding file... {}", path.display());

    let notes = match read_midi_file(path) {
        Ok(notes) => notes,
        Err(e) => {
            log::warn!("Skipping {}: {}", path.display(), e);
            return Ok(String::new());
        }
    };

    let tokens = encode_notes(&notes, config)?;
    let text = tokens_to_text(&tokens);
    fs::write(&cache, &text)?;

    Ok(text)
}

/// Encode every MIDI file below `dir` in parallel and collect the vocabulary
pub fn load_dir(dir: &Path, config: &CodecConfig) -> Result<Corpus, CorpusError> {
    config.validate()?;

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_midi_file(path))
        .collect();
    paths.sort();

    log::info!("Found {} MIDI files under {}", paths.len(), dir.display());

    let encoded: Vec<EncodedFile> = paths
        .into_par_iter()
        .map(|path| {
            let text = encode_file(&path, config)?;
            Ok(EncodedFile { path, text })
        })
        .collect::<Result<Vec<_>, CorpusError>>()?;

    let mut corpus = Corpus::default();
    for file in encoded {
        if file.text.is_empty() {
            continue;
        }
        corpus.vocabulary.extend_from_text(&file.text);
        corpus.files.push(file);
    }

    log::info!(
        "Encoded {} files, vocabulary of {} tokens",
        corpus.files.len(),
        corpus.vocabulary.len()
    );

    Ok(corpus)
}
