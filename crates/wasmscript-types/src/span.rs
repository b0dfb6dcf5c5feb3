use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Source location span.
///
/// `start`/`end` are byte offsets into the source text (half-open).
/// `line`/`col` locate `start` and are 1-based for human-readable messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "offset")]
    pub start: usize,
    #[serde(rename = "end_offset")]
    pub end: usize,
    pub line: u32,
    #[serde(rename = "column")]
    pub col: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize, line: u32, col: u32) -> Self {
        Self {
            start,
            end,
            line,
            col,
        }
    }

    /// Create a zero-width span at a single position.
    pub fn point(offset: usize, line: u32, col: u32) -> Self {
        Self::new(offset, offset, line, col)
    }

    /// Merge two spans into one that covers both.
    ///
    /// The line/column of the result is taken from whichever span starts first.
    pub fn merge(self, other: Span) -> Span {
        let first = if self.start <= other.start { self } else { other };
        Span::new(
            self.start.min(other.start),
            self.end.max(other.end),
            first.line,
            first.col,
        )
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The byte range covered by this span.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Slice the covered text out of `source` (empty if out of range).
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.range()).unwrap_or("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Holds a named source text for tokenizing and error reporting.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Cached line start byte offsets for fast line lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number, without its terminator.
    ///
    /// Returns `None` if the line number is out of range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let range = self.line_range(line_number)?;
        let line = &self.source[range];
        let line = line.strip_suffix('\n').unwrap_or(line);
        // Also strip trailing \r for CRLF
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    /// Byte range of a 1-based line, including its `\n` terminator if present.
    pub fn line_range(&self, line_number: u32) -> Option<Range<usize>> {
        let idx = line_number.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .copied()
            .unwrap_or(self.source.len());
        Some(start..end)
    }

    /// 1-based (line, column) of a byte offset. Offsets past the end clamp to
    /// the final position.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source.len());
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[idx] + 1;
        (idx as u32 + 1, col as u32)
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
