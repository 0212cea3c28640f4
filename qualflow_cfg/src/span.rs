//! Source locations attached to nodes and declarations.
//!
//! The graph never sees source text, so a span only records where the
//! collaborator that built the graph found the construct.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A region of the analysed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset start (0-indexed)
    #[serde(default)]
    pub start: usize,
    /// Byte offset end (exclusive)
    #[serde(default)]
    pub end: usize,
    /// Line number (1-indexed, 0 when unknown)
    #[serde(default)]
    pub line: usize,
    /// Column (1-indexed, 0 when unknown)
    #[serde(default)]
    pub column: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Create a span that only knows its line and column
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            start: 0,
            end: 0,
            line,
            column,
        }
    }

    /// Create an empty span at position 0
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge two spans into one that covers both
    pub fn merge(&self, other: &Span) -> Span {
        let (line, column) = if (self.line, self.column) <= (other.line, other.column) {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            column,
        }
    }

    /// Returns true when no line information was recorded
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "<unknown>")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}
