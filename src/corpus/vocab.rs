// Vocabulary - Token words and their integer indices
// Persisted as a JSON object mapping each word to its sorted position

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use super::CorpusError;

/// Sorted set of every distinct word seen in corpus text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: BTreeSet<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary::default()
    }

    /// Add the space-separated words of `text`
    ///
    /// The newline variant marker is a word of its own, as it is in the
    /// rendered text.
    pub fn extend_from_text(&mut self, text: &str) {
        self.words.extend(
            text.split(' ')
                .filter(|word| !word.is_empty())
                .map(str::to_string),
        );
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word -> index, indices assigned in sorted word order
    pub fn to_index(&self) -> BTreeMap<String, usize> {
        self.words
            .iter()
            .enumerate()
            .map(|(i, word)| (word.clone(), i))
            .collect()
    }

    /// Write the word -> index map as JSON
    pub fn save(&self, path: &Path) -> Result<(), CorpusError> {
        let json = serde_json::to_string(&self.to_index())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a word -> index JSON map written by `save`
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let contents = fs::read_to_string(path)?;
        let index: BTreeMap<String, usize> = serde_json::from_str(&contents)?;
        Ok(Vocabulary {
            words: index.into_keys().collect(),
        })
    }
}
