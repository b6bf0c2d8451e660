// Dataset preparation - Length-limited training lines and a train/test split
// Sequences are cut back to end on a note onset so no line ends mid-gesture

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::CorpusError;
use crate::codec::{parse_tokens, tokens_to_text, Token};

/// Dataset preparation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSettings {
    /// Maximum tokens per training sequence
    pub max_len: usize,

    /// Lines taken from the start of the corpus for training
    pub train_count: usize,

    /// Lines taken from the end of the corpus for testing
    pub test_count: usize,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        DatasetSettings {
            max_len: 128,
            train_count: 10_000,
            test_count: 997,
        }
    }
}

/// Limit a sequence to `max_len` tokens, ending on an onset
///
/// A longer sequence keeps its first `max_len` tokens, then drops trailing
/// tokens back to the last `Onset`. Without any onset in that prefix the
/// prefix is kept whole.
pub fn truncate_sequence(tokens: &[Token], max_len: usize) -> Vec<Token> {
    if tokens.len() <= max_len {
        return tokens.to_vec();
    }

    let prefix = &tokens[..max_len];
    match prefix.iter().rposition(Token::is_onset) {
        Some(last_onset) => prefix[..=last_onset].to_vec(),
        None => prefix.to_vec(),
    }
}

/// Parse corpus text line by line and truncate every sequence
///
/// Blank lines are skipped.
pub fn prepare_sequences(text: &str, max_len: usize) -> Result<Vec<Vec<Token>>, CorpusError> {
    let mut sequences = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let tokens = parse_tokens(line)?;
        sequences.push(truncate_sequence(&tokens, max_len));
    }

    log::debug!("Prepared {} sequences (max_len {})", sequences.len(), max_len);

    Ok(sequences)
}

/// Train and test lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSplit {
    pub train: Vec<String>,
    pub test: Vec<String>,
}

impl DatasetSplit {
    /// First `train_count` lines for training, last `test_count` for testing
    ///
    /// The two sets overlap when the corpus has fewer lines than both
    /// counts together.
    pub fn new(lines: &[String], train_count: usize, test_count: usize) -> Self {
        let train = lines[..train_count.min(lines.len())].to_vec();
        let test = lines[lines.len().saturating_sub(test_count)..].to_vec();
        DatasetSplit { train, test }
    }

    /// Write each set newline-joined, without a trailing newline
    pub fn write(&self, train_path: &Path, test_path: &Path) -> Result<(), CorpusError> {
        fs::write(train_path, self.train.join("\n"))?;
        fs::write(test_path, self.test.join("\n"))?;

        log::info!(
            "Wrote {} training lines to {} and {} test lines to {}",
            self.train.len(),
            train_path.display(),
            self.test.len(),
            test_path.display()
        );

        Ok(())
    }
}

/// Truncate every corpus line and split the result
pub fn prepare_dataset(text: &str, settings: &DatasetSettings) -> Result<DatasetSplit, CorpusError> {
    let lines: Vec<String> = prepare_sequences(text, settings.max_len)?
        .iter()
        .map(|tokens| tokens_to_text(tokens))
        .collect();

    Ok(DatasetSplit::new(&lines, settings.train_count, settings.test_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tokens(text: &str) -> Vec<Token> {
        parse_tokens(text).unwrap()
    }

    #[test]
    fn test_short_sequence_untouched() {
        let seq = tokens("v_100 d_8 n_60 a");
        assert_eq!(truncate_sequence(&seq, 4), seq);
        assert_eq!(truncate_sequence(&seq, 10), seq);
    }

    #[test]
    fn test_truncate_ends_on_onset() {
        let seq = tokens("v_100 d_8 n_60 a d_4 n_62 a n_64");
        assert_eq!(truncate_sequence(&seq, 5), tokens("v_100 d_8 n_60"));
        assert_eq!(truncate_sequence(&seq, 7), tokens("v_100 d_8 n_60 a d_4 n_62"));
    }

    #[test]
    fn test_truncate_without_onset_keeps_prefix() {
        let seq = tokens("d_4 a a a a n_60");
        assert_eq!(truncate_sequence(&seq, 3), tokens("d_4 a a"));
    }

    #[test]
    fn test_prepare_sequences() {
        let text = "v_100 d_8 n_60 a n_62 \n\n   \n d_4 a n_70\n";
        let sequences = prepare_sequences(text, 4).unwrap();

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0], tokens("v_100 d_8 n_60"));
        assert_eq!(sequences[1], tokens("d_4 a n_70"));
    }

    #[test]
    fn test_prepare_sequences_malformed() {
        assert!(prepare_sequences("n_60 q_1\n", 8).is_err());
    }

    #[test]
    fn test_split() {
        let lines: Vec<String> = (0..10).map(|i| format!("n_{}", i)).collect();
        let split = DatasetSplit::new(&lines, 7, 2);

        assert_eq!(split.train.len(), 7);
        assert_eq!(split.test, vec!["n_8".to_string(), "n_9".to_string()]);

        // Small corpora overlap
        let split = DatasetSplit::new(&lines[..3], 7, 2);
        assert_eq!(split.train.len(), 3);
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn test_prepare_dataset_and_write() {
        let temp_dir = TempDir::new().unwrap();
        let train_path = temp_dir.path().join("train.txt");
        let test_path = temp_dir.path().join("test.txt");

        let settings = DatasetSettings {
            max_len: 3,
            train_count: 2,
            test_count: 1,
        };
        let split = prepare_dataset("n_60 a n_61 a\nn_62\nv_80 n_63\n", &settings).unwrap();
        split.write(&train_path, &test_path).unwrap();

        assert_eq!(fs::read_to_string(&train_path).unwrap(), "n_60 a n_61\nn_62");
        assert_eq!(fs::read_to_string(&test_path).unwrap(), "v_80 n_63");
    }
}
