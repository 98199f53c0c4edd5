//! Call-stack frame descriptions for runtime error reports.

use std::fmt;

/// Represents a single active call frame at the time of an error.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame {
///     function_name: Some("fib".to_string()),
///     line: Some(3),
/// };
/// assert_eq!(frame.to_string(), "[line 3] in fib()");
///
/// let script = StackFrame { function_name: None, line: Some(12) };
/// assert_eq!(script.to_string(), "[line 12] in script");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or None for the top-level script
    pub function_name: Option<String>,
    /// Source line of the instruction executing in this frame
    pub line: Option<u32>,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[line {}] in ", line)?,
            None => write!(f, "[line ?] in ")?,
        }
        match &self.function_name {
            Some(name) => write!(f, "{}()", name),
            None => write!(f, "script"),
        }
    }
}

/// Renders a trace as one `[line N] in ...` row per frame, each preceded by
/// a newline.
pub struct StackTrace<'a>(pub &'a [StackFrame]);

impl fmt::Display for StackTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.0 {
            write!(f, "\n{}", frame)?;
        }
        Ok(())
    }
}
