//! Token definitions

use crate::ast::Position;
use logos::{Lexer, Logos, Skip};
use serde::Serialize;
use std::fmt;

/// Line bookkeeping carried through the logos lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCursor {
    /// 1-based line of the current position
    pub line: usize,
    /// Byte offset where the current line starts
    pub line_start: usize,
}

impl Default for LineCursor {
    fn default() -> Self {
        LineCursor {
            line: 1,
            line_start: 0,
        }
    }
}

fn newline(lex: &mut Lexer<TokenKind>) -> Skip {
    lex.extras.line += 1;
    lex.extras.line_start = lex.span().end;
    Skip
}

/// Kind of a Kabkey token
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[logos(extras = LineCursor)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    /// Internal to the logos lexer: the callback advances the line cursor and
    /// skips, so the scanner never yields this kind.
    #[doc(hidden)]
    #[token("\n", newline)]
    Newline,

    /// End of input; produced by the scanner, not by logos.
    Eof,
    /// Unrecognized character sequence
    Illegal,

    #[regex(r"[A-Za-z_]+")]
    Ident,
    #[regex(r"[0-9]+")]
    Int,
    /// A string literal; the closing quote is optional so an unterminated
    /// literal still scans as one token and gets a diagnostic.
    #[regex(r#""[^"\n\r]*"?"#)]
    String,

    // Keywords
    #[token("fn")]
    Function,
    #[token("let")]
    Let,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("while")]
    While,

    // Operators
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("!")]
    Bang,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("==")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("&&")]
    And,
    #[token("||")]
    Or,

    // Delimiters
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

impl TokenKind {
    /// Name used in diagnostics, e.g. `IDENT` or `=`
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Newline => "NEWLINE",
            TokenKind::Eof => "EOF",
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::String => "STRING",
            TokenKind::Function => "FUNCTION",
            TokenKind::Let => "LET",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Return => "RETURN",
            TokenKind::While => "WHILE",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Bang => "!",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scanned token with its literal text and source position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            line: position.line,
            column: position.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} @ {}", self.kind, self.text, self.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        TokenKind::lexer(source).map(|t| t.unwrap_or(TokenKind::Illegal)).collect()
    }

    #[test]
    fn test_keywords_win_over_identifiers() {
        assert_eq!(
            kinds("fn let true false if else return while"),
            vec![
                TokenKind::Function,
                TokenKind::Let,
                TokenKind::True,
                TokenKind::False,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Return,
                TokenKind::While,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(kinds("letter iffy"), vec![TokenKind::Ident, TokenKind::Ident]);
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("== != <= >= && ||"),
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::And,
                TokenKind::Or,
            ]
        );
    }

    #[test]
    fn test_newline_advances_cursor() {
        let mut lex = TokenKind::lexer("a\n  b");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Ident)));
        assert_eq!(lex.extras.line, 1);
        assert_eq!(lex.next(), Some(Ok(TokenKind::Ident)));
        assert_eq!(lex.extras.line, 2);
        assert_eq!(lex.extras.line_start, 2);
    }

    #[test]
    fn test_lone_pipe_is_error() {
        let mut lex = TokenKind::lexer("|");
        assert_eq!(lex.next(), Some(Err(())));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(TokenKind::Ident.to_string(), "IDENT");
        assert_eq!(TokenKind::Assign.to_string(), "=");
        assert_eq!(TokenKind::Function.to_string(), "FUNCTION");
    }
}
