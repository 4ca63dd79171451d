//! Diagnostics and reporting

use crate::ast::Position;
use thiserror::Error;

/// A positioned scan or parse failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("[{position}] {message}")]
    Lexer { message: String, position: Position },

    #[error("[{position}] {message}")]
    Parser { message: String, position: Position },
}

impl Diagnostic {
    pub fn lexer(message: impl Into<String>, position: Position) -> Self {
        Self::Lexer {
            message: message.into(),
            position,
        }
    }

    pub fn parser(message: impl Into<String>, position: Position) -> Self {
        Self::Parser {
            message: message.into(),
            position,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Self::Lexer { position, .. } | Self::Parser { position, .. } => *position,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } | Self::Parser { message, .. } => message,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::Lexer { .. } => "Lexer",
            Self::Parser { .. } => "Parser",
        }
    }
}

/// Render diagnostics the way both front ends print them: one per line,
/// tab-indented.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(|d| format!("\t{d}\n")).collect()
}

/// Report a diagnostic with ariadne
pub fn report_diagnostic(
    filename: &str,
    source: &str,
    diagnostic: &Diagnostic,
) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let start = diagnostic.position().offset_in(source);
    let end = source[start..]
        .chars()
        .next()
        .map_or(start, |c| start + c.len_utf8());

    Report::build(ReportKind::Error, (filename, start..end))
        .with_message(format!("{} error", diagnostic.stage()))
        .with_label(
            Label::new((filename, start..end))
                .with_message(diagnostic.message())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)))
}
