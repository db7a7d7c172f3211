//! Byte ranges into clause text, used by parse errors to point at the
//! offending fragment.

/// A half-open byte range `[start, end)` in the clause text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// The smallest span containing both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// `logos::Span` is a plain `Range<usize>`, so this also covers lexer spans.
impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// Translate a byte offset into 1-based line and column numbers.
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (_, ch) in source.char_indices().take_while(|&(pos, _)| pos < offset) {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_covers_both() {
        let merged = Span::new(3, 8).merge(Span::new(6, 14));
        assert_eq!(merged, Span::new(3, 14));
        // Order does not matter.
        assert_eq!(Span::new(6, 14).merge(Span::new(3, 8)), merged);
    }

    #[test]
    fn test_range_conversion() {
        let span: Span = (2..9).into();
        assert_eq!(span, Span::new(2, 9));
        assert_eq!(span.len(), 7);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_offset_to_line_col() {
        let source = "total > 10\n&& status == \"open\"";

        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 6), (1, 7));
        assert_eq!(offset_to_line_col(source, 11), (2, 1));
        assert_eq!(offset_to_line_col(source, 14), (2, 4));
        // Offsets past the end clamp to the final position.
        assert_eq!(offset_to_line_col(source, 999), (2, 20));
    }
}
