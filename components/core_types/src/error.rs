//! Runtime error types.
//!
//! Every script-level failure aborts the whole run; the error carries the
//! source line of the offending instruction and the active call stack.

use crate::source::{StackFrame, StackTrace};

/// The kind of runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Operand of the wrong type (arithmetic, property access on a non-instance, ...)
    TypeError,
    /// Read or assignment of a global that was never defined
    UndefinedVariable,
    /// Missing field or method
    UndefinedProperty,
    /// Call of a value that is not a function, class or bound method
    NotCallable,
    /// Wrong number of arguments
    ArityMismatch,
    /// Frame or value stack exhausted
    StackOverflow,
    /// Undecodable byte in the instruction stream
    InvalidOpcode,
    /// A host function reported failure
    NativeError,
    /// The output sink for `print` failed
    Io,
}

/// A runtime error with message and stack trace.
///
/// The display form matches what a script author sees:
///
/// ```
/// use core_types::{RuntimeError, RuntimeErrorKind, StackFrame};
///
/// let error = RuntimeError::new(RuntimeErrorKind::UndefinedVariable, "Undefined variable 'x'.")
///     .with_trace(vec![StackFrame { function_name: None, line: Some(1) }]);
///
/// assert_eq!(error.line, Some(1));
/// assert_eq!(error.to_string(), "Undefined variable 'x'.\n[line 1] in script");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}{}", StackTrace(.trace))]
pub struct RuntimeError {
    /// The type of error
    pub kind: RuntimeErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Source line of the instruction that failed
    pub line: Option<u32>,
    /// Active frames at the time of the error, innermost first
    pub trace: Vec<StackFrame>,
}

impl RuntimeError {
    /// Creates an error without location information.
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            trace: Vec::new(),
        }
    }

    /// Attaches the call stack; the innermost frame supplies the line.
    pub fn with_trace(mut self, trace: Vec<StackFrame>) -> Self {
        self.line = trace.first().and_then(|frame| frame.line);
        self.trace = trace;
        self
    }
}
