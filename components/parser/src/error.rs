//! Compile error types

use std::fmt;

/// Where in the source a compile error points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At a specific token
    At(String),
    /// At end of input
    End,
    /// The lexer already described the location
    Unspecified,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::At(lexeme) => write!(f, " at '{}'", lexeme),
            ErrorLocation::End => write!(f, " at end"),
            ErrorLocation::Unspecified => Ok(()),
        }
    }
}

/// A single compile error.
///
/// # Examples
///
/// ```
/// use parser::{CompileError, ErrorLocation};
///
/// let error = CompileError {
///     line: 3,
///     location: ErrorLocation::At("=".to_string()),
///     message: "Invalid assignment target.".to_string(),
/// };
/// assert_eq!(error.to_string(), "[line 3] Error at '=': Invalid assignment target.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct CompileError {
    /// Source line
    pub line: u32,
    /// Offending token
    pub location: ErrorLocation,
    /// What went wrong
    pub message: String,
}

/// Every error reported by one compilation, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileErrors(pub Vec<CompileError>);

impl std::error::Error for CompileErrors {}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl CompileErrors {
    /// The individual errors
    pub fn errors(&self) -> &[CompileError] {
        &self.0
    }
}
