//! Error types for the CLI

use core_types::RuntimeError;
use parser::CompileErrors;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Source did not compile
    #[error("{0}")]
    Compile(#[from] CompileErrors),

    /// Script failed while running
    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    /// File or terminal I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Line editor failed
    #[error("REPL error: {0}")]
    Repl(String),
}

impl CliError {
    /// Process exit status for this error, following the sysexits convention.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Compile(_) => 65,
            CliError::Runtime(_) => 70,
            CliError::Io(_) | CliError::Repl(_) => 74,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
