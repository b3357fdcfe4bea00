//! Assembly diagnostics.
//!
//! The assembler never stops at the first problem: every phase pushes
//! [`Diagnostic`]s into one list and the caller receives them all, sorted
//! into source order. Each diagnostic carries a 1-based line number and a
//! rendered message.

use crate::encoder::EncodeError;
use crate::parser::ParseError;

/// One reported assembly error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line number.
    pub line: u32,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl From<ParseError> for Diagnostic {
    fn from(error: ParseError) -> Self {
        Self::new(error.line, error.to_string())
    }
}

impl From<EncodeError> for Diagnostic {
    fn from(error: EncodeError) -> Self {
        Self::new(error.line, error.to_string())
    }
}
