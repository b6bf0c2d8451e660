// Codec errors
// Failures raised while validating configuration or parsing token text

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A word in token text that is not one of `a`, `d_<int>`, `v_<int>`, `n_<int>`
    #[error("Malformed token {token:?} at position {position}")]
    MalformedToken { position: usize, token: String },

    /// Playhead or total duration left the i64 range
    #[error("Duration overflow at token {position}")]
    DurationOverflow { position: usize },

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
