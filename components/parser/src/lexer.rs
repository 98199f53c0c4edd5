//! Lox Lexer - tokenizes source code into tokens
//!
//! The lexer is pull-based: the compiler asks for one token at a time and
//! never needs more than one token of lookahead. Lexical errors come back as
//! [`TokenKind::Error`] tokens whose lexeme is the message.

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `;`
    Semicolon,
    /// `/`
    Slash,
    /// `*`
    Star,

    // One or two character tokens
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,

    // Literals
    /// Identifier
    Identifier,
    /// String literal, lexeme includes the quotes
    String,
    /// Number literal
    Number,

    // Keywords
    /// `and`
    And,
    /// `class`
    Class,
    /// `else`
    Else,
    /// `false`
    False,
    /// `for`
    For,
    /// `fun`
    Fun,
    /// `if`
    If,
    /// `nil`
    Nil,
    /// `or`
    Or,
    /// `print`
    Print,
    /// `return`
    Return,
    /// `super`
    Super,
    /// `this`
    This,
    /// `true`
    True,
    /// `var`
    Var,
    /// `while`
    While,

    /// Lexical error; the lexeme holds the message
    Error,
    /// End of input
    Eof,
}

/// A token borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// Token kind
    pub kind: TokenKind,
    /// Source text of the token (or the message for error tokens)
    pub lexeme: &'src str,
    /// 1-based source line
    pub line: u32,
}

fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "and" => TokenKind::And,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "fun" => TokenKind::Fun,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}

/// Lox lexer
///
/// # Examples
///
/// ```
/// use parser::{Lexer, TokenKind};
///
/// let mut lexer = Lexer::new("var x = 1;");
/// let kinds: Vec<TokenKind> = std::iter::from_fn(|| {
///     let token = lexer.scan_token();
///     (token.kind != TokenKind::Eof).then_some(token.kind)
/// })
/// .collect();
///
/// assert_eq!(
///     kinds,
///     vec![
///         TokenKind::Var,
///         TokenKind::Identifier,
///         TokenKind::Equal,
///         TokenKind::Number,
///         TokenKind::Semicolon,
///     ]
/// );
/// ```
pub struct Lexer<'src> {
    source: &'src str,
    start: usize,
    current: usize,
    line: u32,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scan the next token. Returns `Eof` forever once input is exhausted.
    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        if is_alpha(c) {
            return self.identifier();
        }
        if c.is_ascii_digit() {
            return self.number();
        }

        match c {
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b';' => self.make_token(TokenKind::Semicolon),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),
            b'!' => self.two_char(b'=', TokenKind::BangEqual, TokenKind::Bang),
            b'=' => self.two_char(b'=', TokenKind::EqualEqual, TokenKind::Equal),
            b'<' => self.two_char(b'=', TokenKind::LessEqual, TokenKind::Less),
            b'>' => self.two_char(b'=', TokenKind::GreaterEqual, TokenKind::Greater),
            b'"' => self.string(),
            _ => {
                // Swallow the rest of a multi-byte character so the next
                // token starts on a char boundary.
                while !self.source.is_char_boundary(self.current) {
                    self.current += 1;
                }
                self.error_token("Unexpected character.")
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current + 1).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.current += 1;
        Some(c)
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn two_char(&mut self, second: u8, matched: TokenKind, single: TokenKind) -> Token<'src> {
        let kind = if self.matches(second) { matched } else { single };
        self.make_token(kind)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\r' | b'\t' => self.current += 1,
                b'\n' => {
                    self.line += 1;
                    self.current += 1;
                }
                b'/' if self.peek_next() == Some(b'/') => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.current += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self) -> Token<'src> {
        while let Some(c) = self.peek() {
            if c == b'"' {
                break;
            }
            if c == b'\n' {
                self.line += 1;
            }
            self.current += 1;
        }
        if self.peek().is_none() {
            return self.error_token("Unterminated string.");
        }
        // The closing quote.
        self.current += 1;
        self.make_token(TokenKind::String)
    }

    fn number(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
        }
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.current += 1;
            }
        }
        self.make_token(TokenKind::Number)
    }

    fn identifier(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|c| is_alpha(c) || c.is_ascii_digit()) {
            self.current += 1;
        }
        let kind = keyword(&self.source[self.start..self.current]).unwrap_or(TokenKind::Identifier);
        self.make_token(kind)
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token {
            kind,
            lexeme: &self.source[self.start..self.current],
            line: self.line,
        }
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token {
            kind: TokenKind::Error,
            lexeme: message,
            line: self.line,
        }
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}
