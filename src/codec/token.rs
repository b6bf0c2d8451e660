// Tokens - The five-symbol vocabulary and its text form
// `a`, `d_<n>`, `v_<n>`, `n_<n>`, with a newline closing each variant

use std::fmt;

use super::error::{CodecError, CodecResult};

/// One symbol of the encoded stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Move the playhead forward by the current duration
    Advance,

    /// Set the duration register, in duration units
    Duration(i64),

    /// Set the velocity register
    Velocity(i32),

    /// Play a note at the playhead with the current registers
    Onset(i32),

    /// Closes one augmentation variant
    EndOfSequence,
}

impl Token {
    /// Parse a single whitespace-free word
    /// `position` is only used to label the error.
    pub fn parse_word(word: &str, position: usize) -> CodecResult<Token> {
        let malformed = || CodecError::MalformedToken {
            position,
            token: word.to_string(),
        };

        if word == "a" {
            return Ok(Token::Advance);
        }

        let (prefix, payload) = word.split_once('_').ok_or_else(malformed)?;
        match prefix {
            "d" => payload.parse().map(Token::Duration).map_err(|_| malformed()),
            "v" => payload.parse().map(Token::Velocity).map_err(|_| malformed()),
            "n" => payload.parse().map(Token::Onset).map_err(|_| malformed()),
            _ => Err(malformed()),
        }
    }

    pub fn is_onset(&self) -> bool {
        matches!(self, Token::Onset(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Advance => write!(f, "a"),
            Token::Duration(d) => write!(f, "d_{}", d),
            Token::Velocity(v) => write!(f, "v_{}", v),
            Token::Onset(p) => write!(f, "n_{}", p),
            Token::EndOfSequence => writeln!(f),
        }
    }
}

/// Render tokens the way corpus text files store them
///
/// Every token, the newline marker included, is joined with a single space,
/// so a two-variant stream reads `"v_100 d_8 n_60 \n v_100 d_8 n_62 \n"`.
pub fn tokens_to_text(tokens: &[Token]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(&token.to_string());
    }
    text
}

/// Parse token text back into tokens
///
/// Words are separated by any whitespace; each newline becomes an
/// `EndOfSequence`. Error positions count tokens, markers included.
pub fn parse_tokens(text: &str) -> CodecResult<Vec<Token>> {
    let mut tokens = Vec::new();

    for line in text.split_inclusive('\n') {
        for word in line.split_whitespace() {
            let token = Token::parse_word(word, tokens.len())?;
            tokens.push(token);
        }
        if line.ends_with('\n') {
            tokens.push(Token::EndOfSequence);
        }
    }

    Ok(tokens)
}

/// Split a concatenated stream into its variants
///
/// Each slice excludes its `EndOfSequence`. Tokens after the last marker
/// form a final, unterminated variant.
pub fn split_variants(tokens: &[Token]) -> Vec<&[Token]> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut variants: Vec<&[Token]> = tokens
        .split(|token| *token == Token::EndOfSequence)
        .collect();

    // `split` yields an empty tail after a trailing marker
    if tokens.last() == Some(&Token::EndOfSequence) {
        variants.pop();
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Token::Advance.to_string(), "a");
        assert_eq!(Token::Duration(8).to_string(), "d_8");
        assert_eq!(Token::Velocity(100).to_string(), "v_100");
        assert_eq!(Token::Onset(60).to_string(), "n_60");
        assert_eq!(Token::EndOfSequence.to_string(), "\n");
    }

    #[test]
    fn test_tokens_to_text_matches_cache_format() {
        let tokens = vec![
            Token::Velocity(100),
            Token::Duration(8),
            Token::Onset(60),
            Token::EndOfSequence,
            Token::Velocity(100),
            Token::Duration(8),
            Token::Onset(62),
            Token::EndOfSequence,
        ];
        assert_eq!(
            tokens_to_text(&tokens),
            "v_100 d_8 n_60 \n v_100 d_8 n_62 \n"
        );
    }

    #[test]
    fn test_parse_simple() {
        let tokens = parse_tokens("d_8 v_100 n_60 a n_60").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Duration(8),
                Token::Velocity(100),
                Token::Onset(60),
                Token::Advance,
                Token::Onset(60),
            ]
        );
    }

    #[test]
    fn test_parse_newlines_become_markers() {
        let tokens = parse_tokens("n_60 \n n_61\nn_62\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Onset(60),
                Token::EndOfSequence,
                Token::Onset(61),
                Token::EndOfSequence,
                Token::Onset(62),
                Token::EndOfSequence,
            ]
        );
    }

    #[test]
    fn test_parse_rendered_text() {
        let tokens = vec![
            Token::Duration(4),
            Token::Advance,
            Token::Velocity(-8),
            Token::Onset(31),
            Token::EndOfSequence,
        ];
        assert_eq!(parse_tokens(&tokens_to_text(&tokens)).unwrap(), tokens);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_tokens("").unwrap().is_empty());
        assert!(parse_tokens("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_unknown_prefix() {
        let err = parse_tokens("d_8 x_3 n_60").unwrap_err();
        assert_eq!(
            err,
            CodecError::MalformedToken {
                position: 1,
                token: "x_3".to_string()
            }
        );
    }

    #[test]
    fn test_parse_bad_payload() {
        let err = parse_tokens("n_60 \n d_eight").unwrap_err();
        assert_eq!(
            err,
            CodecError::MalformedToken {
                position: 2,
                token: "d_eight".to_string()
            }
        );

        assert!(parse_tokens("n_").is_err());
        assert!(parse_tokens("n_6.5").is_err());
        assert!(parse_tokens("advance").is_err());
        assert!(parse_tokens("d8").is_err());
    }

    #[test]
    fn test_split_variants() {
        let tokens = parse_tokens("n_60 \n n_61 \n").unwrap();
        let variants = split_variants(&tokens);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0], &[Token::Onset(60)]);
        assert_eq!(variants[1], &[Token::Onset(61)]);
    }

    #[test]
    fn test_split_variants_unterminated_tail() {
        let tokens = parse_tokens("n_60 \n n_61").unwrap();
        let variants = split_variants(&tokens);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1], &[Token::Onset(61)]);

        assert!(split_variants(&[]).is_empty());
    }
}
