//! midi-text command line
//!
//! Usage:
//!   midi-text encode song.mid              - Print the token text of a MIDI file
//!   midi-text decode song.txt -o out.mid   - Rebuild a MIDI file from token text
//!   midi-text duration song.txt            - Seconds covered by token text
//!   midi-text corpus midi_database/        - Encode a folder and build the vocabulary
//!   midi-text prepare corpus.txt ...       - Truncate and split into train/test files

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use midi_text::codec::{self, Augmentation, CodecConfig};
use midi_text::corpus::{self, DatasetSettings};
use midi_text::midi::{self, MidiExportOptions};

#[derive(Parser)]
#[command(name = "midi-text", about = "Quantized text tokens for MIDI performances")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a MIDI file to token text
    Encode {
        input: PathBuf,

        /// JSON codec configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Transposition span (overrides the config)
        #[arg(long)]
        transpose: Option<u32>,

        /// Time stretch span (overrides the config)
        #[arg(long)]
        stretch: Option<u32>,

        /// Velocity stretch span (overrides the config)
        #[arg(long)]
        velocity: Option<u32>,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode token text to a MIDI file
    Decode {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, default_value_t = 120.0)]
        tempo: f64,

        /// Decode only this variant (0-based), with fresh registers
        #[arg(long)]
        variant: Option<usize>,
    },
    /// Print the elapsed seconds of token text
    Duration {
        input: PathBuf,

        #[arg(short, long, default_value_t = 120.0)]
        tempo: f64,
    },
    /// Encode every MIDI file under a directory
    Corpus {
        dir: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the word -> index JSON
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Where to write the concatenated corpus text
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Truncate corpus lines and split them into train/test files
    Prepare {
        input: PathBuf,

        #[arg(long, default_value_t = 128)]
        max_len: usize,

        #[arg(long, default_value_t = 10_000)]
        train_count: usize,

        #[arg(long, default_value_t = 997)]
        test_count: usize,

        #[arg(long)]
        train_out: PathBuf,

        #[arg(long)]
        test_out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            input,
            config,
            transpose,
            stretch,
            velocity,
            output,
        } => {
            let mut config = load_config(config.as_deref())?;
            let augmentation = config.augmentation;
            config.augmentation = Augmentation::new(
                transpose.unwrap_or(augmentation.transpose),
                stretch.unwrap_or(augmentation.time_stretch),
                velocity.unwrap_or(augmentation.velocity_stretch),
            );
            encode_command(&input, &config, output.as_deref())
        }
        Commands::Decode {
            input,
            output,
            tempo,
            variant,
        } => decode_command(&input, &output, tempo, variant),
        Commands::Duration { input, tempo } => duration_command(&input, tempo),
        Commands::Corpus {
            dir,
            config,
            vocab,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            corpus_command(&dir, &config, vocab.as_deref(), output.as_deref())
        }
        Commands::Prepare {
            input,
            max_len,
            train_count,
            test_count,
            train_out,
            test_out,
        } => {
            let settings = DatasetSettings {
                max_len,
                train_count,
                test_count,
            };
            prepare_command(&input, &settings, &train_out, &test_out)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CodecConfig> {
    match path {
        Some(path) => CodecConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CodecConfig::default()),
    }
}

fn read_tokens(path: &Path) -> Result<Vec<codec::Token>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    codec::parse_tokens(&text).with_context(|| format!("Malformed token text in {}", path.display()))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, text).with_context(|| format!("Failed to write {}", path.display())),
        None => {
            io::stdout().write_all(text.as_bytes())?;
            Ok(())
        }
    }
}

fn encode_command(input: &Path, config: &CodecConfig, output: Option<&Path>) -> Result<()> {
    let notes = midi::read_midi_file(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let tokens = codec::encode_notes(&notes, config)?;

    log::info!(
        "Encoded {} notes into {} variants",
        notes.len(),
        config.augmentation.variant_count()
    );

    write_output(output, &codec::tokens_to_text(&tokens))
}

fn decode_command(input: &Path, output: &Path, tempo: f64, variant: Option<usize>) -> Result<()> {
    let tokens = read_tokens(input)?;

    let notes = match variant {
        Some(index) => {
            let mut variants = codec::decode_variants(&tokens, tempo)?;
            if index >= variants.len() {
                bail!("Variant {} requested but {} has {}", index, input.display(), variants.len());
            }
            variants.swap_remove(index)
        }
        None => codec::decode(&tokens, tempo)?,
    };

    midi::write_midi_file(output, &notes, tempo, &MidiExportOptions::default())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!("Wrote {} notes to {}", notes.len(), output.display());
    Ok(())
}

fn duration_command(input: &Path, tempo: f64) -> Result<()> {
    let tokens = read_tokens(input)?;
    let seconds = codec::total_duration(&tokens, tempo)?;
    println!("{:.3}", seconds);
    Ok(())
}

fn corpus_command(dir: &Path, config: &CodecConfig, vocab: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let corpus = corpus::load_dir(dir, config).with_context(|| format!("Failed to encode {}", dir.display()))?;

    if let Some(path) = vocab {
        corpus
            .vocabulary
            .save(path)
            .with_context(|| format!("Failed to write vocabulary {}", path.display()))?;
        log::info!("Saved {} words to {}", corpus.vocabulary.len(), path.display());
    }

    if let Some(path) = output {
        write_output(Some(path), &corpus.text())?;
    }

    Ok(())
}

fn prepare_command(input: &Path, settings: &DatasetSettings, train_out: &Path, test_out: &Path) -> Result<()> {
    let text = fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let split = corpus::prepare_dataset(&text, settings)?;
    split.write(train_out, test_out)?;
    Ok(())
}
