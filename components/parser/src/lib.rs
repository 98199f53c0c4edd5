//! Lox Compiler Component
//!
//! Turns Lox source text into bytecode functions on the shared heap.
//!
//! # Overview
//!
//! - [`Lexer`] - On-demand scanner producing borrowed [`Token`]s
//! - [`compile`] - Single-pass Pratt compiler emitting one chunk per function
//! - [`CompileErrors`] - Every syntax error found, one per statement at most
//! - [`FunctionScope`] - Locals, upvalues and block depth of a function body
//!
//! # Example
//!
//! ```
//! use memory_manager::{Heap, NoRoots};
//!
//! let mut heap = Heap::new();
//! let script = parser::compile("var x = 42;", &mut heap, &NoRoots).unwrap();
//! assert!(!heap.as_function(script).chunk.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod scope;

pub use compiler::compile;
pub use error::{CompileError, CompileErrors, ErrorLocation};
pub use lexer::{Lexer, Token, TokenKind};
pub use scope::{ClassScope, FunctionKind, FunctionScope, Local, UpvalueRef, MAX_LOCALS};
