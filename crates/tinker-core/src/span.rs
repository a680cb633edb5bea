//! Source locations and spans.

use std::fmt;

/// A byte offset range into one source file, plus the line/column of its
/// start for human-facing rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A zero-width span at the start of the file, used for synthesized
    /// nodes that have no corresponding source text (e.g. an implicit
    /// conversion).
    pub const fn synthetic() -> Self {
        Self::new(0, 0, 1, 1)
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest span containing both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        if other.start >= self.start {
            Span::new(self.start, other.end, self.line, self.column)
        } else {
            Span::new(other.start, self.end, other.line, other.column)
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span together with the path of the file it was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Option<String>,
    pub span: Span,
}

impl Location {
    pub fn new(file: Option<String>, span: Span) -> Self {
        Self { file, span }
    }

    pub fn synthetic() -> Self {
        Self::new(None, Span::synthetic())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}", self.span),
            None => write!(f, "{}", self.span),
        }
    }
}
