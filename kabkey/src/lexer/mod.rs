//! Lexer implementation using logos
//!
//! [`Scanner`] wraps the logos-generated lexer to produce [`Token`]s one at a
//! time with 1-based line/column positions, and collects scan diagnostics
//! instead of stopping at the first bad character.

mod token;

pub use token::{LineCursor, Token, TokenKind};

use crate::ast::Position;
use crate::error::Diagnostic;
use logos::Logos;

/// Lazily scans source text into tokens
pub struct Scanner<'src> {
    source: &'src str,
    lexer: logos::Lexer<'src, TokenKind>,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Scanner {
            source,
            lexer: TokenKind::lexer_with_extras(source, LineCursor::default()),
            diagnostics: Vec::new(),
        }
    }

    /// Scan the next token. Once input is exhausted this returns an
    /// end-of-input token on every call.
    pub fn next_token(&mut self) -> Token {
        let Some(result) = self.lexer.next() else {
            let end = self.source.len();
            return Token::new(TokenKind::Eof, "", self.position_of(end));
        };

        let span = self.lexer.span();
        let slice = self.lexer.slice();
        let position = self.position_of(span.start);

        match result {
            Ok(TokenKind::String) => self.string_token(slice, position),
            Ok(kind) => Token::new(kind, slice, position),
            Err(()) => {
                self.diagnostics.push(Diagnostic::lexer(
                    format!("illegal character sequence {slice:?}"),
                    position,
                ));
                Token::new(TokenKind::Illegal, slice, position)
            }
        }
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// The token carries the raw text between the quotes; escapes are left
    /// for consumers to interpret.
    fn string_token(&mut self, slice: &str, position: Position) -> Token {
        let terminated = slice.len() >= 2 && slice.ends_with('"');
        let body = if terminated {
            &slice[1..slice.len() - 1]
        } else {
            let offending = Position::new(position.line, position.column + slice.chars().count());
            self.diagnostics.push(Diagnostic::lexer(
                "string not terminated with closing quote",
                offending,
            ));
            &slice[1..]
        };
        Token::new(TokenKind::String, body, position)
    }

    fn position_of(&self, offset: usize) -> Position {
        let cursor = self.lexer.extras;
        let column = self.source[cursor.line_start..offset].chars().count() + 1;
        Position::new(cursor.line, column)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    /// Yields tokens up to, but not including, end of input.
    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

/// Tokenize a whole source string
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut scanner = Scanner::new(source);
    let tokens = scanner.by_ref().collect();
    (tokens, scanner.into_diagnostics())
}
