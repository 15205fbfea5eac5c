use std::fmt;

use thiserror::Error;

/// Lexical failure in movetext. Offsets are byte positions in the full PGN text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
    #[error("unmatched '}}' at byte {offset}")]
    UnmatchedCloseBrace { offset: usize },
    #[error("unexpected character {ch:?} at byte {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },
}

/// Why the legality oracle refused a SAN token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    Unparseable,
    Illegal,
    Ambiguous,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unparseable => "not valid SAN",
            Self::Illegal => "illegal in this position",
            Self::Ambiguous => "ambiguous in this position",
        };
        f.write_str(s)
    }
}

/// A move token the oracle rejected. `ply` is 1-based from the game start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("move '{san}' at ply {ply} (byte {offset}) is {reason}")]
pub struct LegalityError {
    pub san: String,
    pub ply: usize,
    pub offset: usize,
    pub reason: MoveRejection,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Legality(#[from] LegalityError),
    #[error("malformed tag pair at byte {offset}")]
    MalformedTag { offset: usize },
    #[error("')' without matching '(' at byte {offset}")]
    UnmatchedCloseVariation { offset: usize },
    #[error("variation opened at byte {offset} is never closed")]
    UnclosedVariation { offset: usize },
    #[error("variation at byte {offset} has no move to be an alternative to")]
    VariationWithoutMove { offset: usize },
    #[error("move number {found} at byte {offset} goes backwards (previous {previous})")]
    MoveNumberOutOfOrder {
        offset: usize,
        previous: u32,
        found: u32,
    },
    #[error("game result inside a variation at byte {offset}")]
    ResultInVariation { offset: usize },
    #[error("variations nested deeper than {limit} at byte {offset}")]
    NestingTooDeep { offset: usize, limit: usize },
}

impl ParseError {
    /// Byte offset into the PGN text where the problem was detected.
    pub fn offset(&self) -> usize {
        match self {
            Self::Tokenize(
                TokenizeError::UnterminatedComment { offset }
                | TokenizeError::UnmatchedCloseBrace { offset }
                | TokenizeError::UnexpectedCharacter { offset, .. },
            ) => *offset,
            Self::Legality(err) => err.offset,
            Self::MalformedTag { offset }
            | Self::UnmatchedCloseVariation { offset }
            | Self::UnclosedVariation { offset }
            | Self::VariationWithoutMove { offset }
            | Self::MoveNumberOutOfOrder { offset, .. }
            | Self::ResultInVariation { offset }
            | Self::NestingTooDeep { offset, .. } => *offset,
        }
    }
}

/// A serialized chapter that a standard PGN reader does not read back as the
/// same main line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chapter does not re-read cleanly: {0}")]
pub struct VerifyError(pub String);

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first");
        accumulator.push("second");

        assert_eq!(accumulator.take().as_deref(), Some("first; second"));
        assert!(accumulator.is_empty());
    }

    #[test]
    fn test_legality_error_message_names_token_and_ply() {
        let err = ParseError::from(LegalityError {
            san: "Ke3".to_string(),
            ply: 3,
            offset: 17,
            reason: MoveRejection::Illegal,
        });

        assert_eq!(
            err.to_string(),
            "move 'Ke3' at ply 3 (byte 17) is illegal in this position"
        );
        assert_eq!(err.offset(), 17);
    }

    #[test]
    fn test_tokenize_error_offset_is_exposed() {
        let err = ParseError::from(TokenizeError::UnterminatedComment { offset: 42 });
        assert_eq!(err.offset(), 42);
        assert_eq!(err.to_string(), "unterminated comment starting at byte 42");
    }
}
