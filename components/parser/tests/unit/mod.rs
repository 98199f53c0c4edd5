//! Unit tests for parser

mod test_compiler;
mod test_lexer;
