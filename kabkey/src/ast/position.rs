//! Source location tracking

use serde::Serialize;

/// A 1-based line/column location in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Byte offset of this position within `source`, clamped to its length.
    ///
    /// Columns count characters, so multi-byte text before the position is
    /// accounted for.
    pub fn offset_in(&self, source: &str) -> usize {
        let mut line_start = 0;
        for _ in 1..self.line {
            match source[line_start..].find('\n') {
                Some(i) => line_start += i + 1,
                None => return source.len(),
            }
        }
        let line = &source[line_start..];
        let column = self.column.saturating_sub(1);
        line.char_indices()
            .nth(column)
            .map(|(i, _)| line_start + i)
            .unwrap_or(source.len())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(3, 14).to_string(), "3:14");
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 9) < Position::new(2, 1));
        assert!(Position::new(2, 1) < Position::new(2, 5));
    }

    #[test]
    fn test_offset_first_line() {
        assert_eq!(Position::new(1, 1).offset_in("let x = 5;"), 0);
        assert_eq!(Position::new(1, 5).offset_in("let x = 5;"), 4);
    }

    #[test]
    fn test_offset_later_line() {
        let source = "let a = 1;\nlet b = 2;";
        assert_eq!(Position::new(2, 5).offset_in(source), 15);
    }

    #[test]
    fn test_offset_past_end_clamps() {
        assert_eq!(Position::new(1, 40).offset_in("abc"), 3);
        assert_eq!(Position::new(9, 1).offset_in("abc"), 3);
    }

    #[test]
    fn test_offset_counts_characters() {
        // "é" is two bytes
        assert_eq!(Position::new(1, 3).offset_in("éab"), 3);
    }
}
