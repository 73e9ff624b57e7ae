use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected character at {pos}: expected {expected}, found {found}")]
    UnexpectedChar {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of template at {pos}")]
    UnexpectedEof { pos: usize },

    #[error("Unterminated tag <{tag}> starting at {pos}")]
    UnterminatedTag { pos: usize, tag: String },

    #[error("Mismatched closing tag at {pos}: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unterminated interpolation starting at {pos}")]
    UnterminatedInterpolation { pos: usize },

    #[error("Unterminated comment starting at {pos}")]
    UnterminatedComment { pos: usize },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },
}

impl ParseError {
    pub fn unexpected_char(
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedChar {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::UnexpectedEof { pos }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    /// Source offset the error points at.
    pub fn pos(&self) -> usize {
        match self {
            Self::UnexpectedChar { pos, .. }
            | Self::UnexpectedEof { pos }
            | Self::UnterminatedTag { pos, .. }
            | Self::MismatchedClosingTag { pos, .. }
            | Self::UnterminatedInterpolation { pos }
            | Self::UnterminatedComment { pos }
            | Self::InvalidSyntax { pos, .. } => *pos,
        }
    }
}
