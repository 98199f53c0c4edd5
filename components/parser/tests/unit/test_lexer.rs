//! Lexer behaviour over whole inputs

use parser::{Lexer, TokenKind};
use proptest::prelude::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(source);
    let mut kinds = Vec::new();
    loop {
        let token = lexer.scan_token();
        kinds.push(token.kind);
        if token.kind == TokenKind::Eof {
            return kinds;
        }
    }
}

#[test]
fn test_class_declaration_tokens() {
    use TokenKind::*;
    assert_eq!(
        kinds("class B < A { init() { super.init(); } }"),
        vec![
            Class, Identifier, Less, Identifier, LeftBrace, Identifier, LeftParen, RightParen,
            LeftBrace, Super, Dot, Identifier, LeftParen, RightParen, Semicolon, RightBrace,
            RightBrace, Eof,
        ]
    );
}

#[test]
fn test_comments_and_lines() {
    let mut lexer = Lexer::new("// first\nvar x;\n\n// last");
    let var = lexer.scan_token();
    assert_eq!(var.kind, TokenKind::Var);
    assert_eq!(var.line, 2);
    lexer.scan_token();
    lexer.scan_token();
    let eof = lexer.scan_token();
    assert_eq!(eof.kind, TokenKind::Eof);
    assert_eq!(eof.line, 4);
}

#[test]
fn test_multiline_string_advances_line() {
    let mut lexer = Lexer::new("\"a\nb\" x");
    let string = lexer.scan_token();
    assert_eq!(string.kind, TokenKind::String);
    assert_eq!(string.lexeme, "\"a\nb\"");
    assert_eq!(lexer.scan_token().line, 2);
}

proptest! {
    #[test]
    fn prop_scanning_always_terminates(source in ".{0,64}") {
        let mut lexer = Lexer::new(&source);
        let mut previous_line = 1;
        let mut reached_end = false;
        // Each token consumes at least one character.
        for _ in 0..=source.len() {
            let token = lexer.scan_token();
            prop_assert!(token.line >= previous_line);
            previous_line = token.line;
            if token.kind == TokenKind::Eof {
                reached_end = true;
                break;
            }
        }
        prop_assert!(reached_end);
    }
}
