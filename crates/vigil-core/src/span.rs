//! Half-open byte ranges into a single source text.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn from_range(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            len: range.end.saturating_sub(range.start),
        }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, len: 0 }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// Two spans overlap when each starts before the other ends: they share a byte,
    /// or one is empty and sits strictly inside the other. Touching spans do not.
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Whether the span lies inside `text` on UTF-8 character boundaries.
    pub fn is_valid_for(&self, text: &str) -> bool {
        self.end() <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::from_range(range)
    }
}
