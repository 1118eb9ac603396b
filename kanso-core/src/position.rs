// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Source positions and spans.
//!
//! Positions are cheap [`Copy`] values; the file name travels alongside the
//! source buffer (and on each [`Diagnostic`]) rather than on every token.
//! Offsets are byte indices into the original UTF-8 buffer, so for any
//! well-formed span `source[span.start.offset..span.end.offset]` is exactly
//! the text the span covers.
//!
//! [`Diagnostic`]: crate::Diagnostic

use serde::Serialize;
use std::fmt;

/// A point in a source file: 1-based line and column, 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    /// The first byte of a file.
    pub const fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    pub const fn new(line: u32, column: u32, offset: u32) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Position advanced past `text`, tracking newlines.
    pub fn advanced(mut self, text: &str) -> Self {
        for b in text.bytes() {
            self.offset += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open `[start, end)` region of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`.
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: if self.start.offset <= other.start.offset {
                self.start
            } else {
                other.start
            },
            end: if self.end.offset >= other.end.offset {
                self.end
            } else {
                other.end
            },
        }
    }

    pub fn len(&self) -> usize {
        (self.end.offset - self.start.offset) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// The slice of `source` this span covers.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start.offset as usize..self.end.offset as usize]
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::point(Position::start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let pos = Position::start().advanced("ab\ncd");
        assert_eq!(pos, Position::new(2, 3, 5));
    }

    #[test]
    fn span_round_trips_source_text() {
        let source = "let x = 42;";
        let start = Position::start().advanced("let ");
        let end = start.advanced("x");
        let span = Span::new(start, end);
        assert_eq!(span.text(source), "x");
        assert_eq!(span.len(), 1);
    }

    #[test]
    fn span_join_covers_both() {
        let a = Span::new(Position::new(1, 1, 0), Position::new(1, 3, 2));
        let b = Span::new(Position::new(1, 5, 4), Position::new(1, 8, 7));
        assert_eq!(a.to(b), Span::new(a.start, b.end));
        assert_eq!(b.to(a), Span::new(a.start, b.end));
    }
}
