//! Byte offset to line/column conversion.
//!
//! Every finalized tree carries a [`LineIndex`] for its buffer so node point
//! ranges can be answered in O(log n) without storing points in the tree.

use crate::syntax::{Point, TextSize};

/// Cached line-start offsets for a single buffer.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets of line starts; the first line always starts at 0.
    line_starts: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    /// Scan the buffer once and record every line start.
    ///
    /// `\n` terminates a line; `\r\n` counts as a single terminator.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::zero()];
        for pos in memchr::memchr_iter(b'\n', text.as_bytes()) {
            let offset = u32::try_from(pos).unwrap_or(u32::MAX).saturating_add(1);
            line_starts.push(TextSize::from(offset));
        }

        Self {
            line_starts,
            text_len: TextSize::of(text),
        }
    }

    /// Convert a byte offset to a zero-based line/column position.
    ///
    /// Offsets past the end of the buffer are clamped to the last position.
    #[must_use]
    pub fn point(&self, offset: TextSize) -> Point {
        let offset = offset.min(self.text_len);
        let row = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };

        let line_start = self.line_starts[row];
        Point {
            row: u32::try_from(row).unwrap_or(u32::MAX),
            column: offset.into() - line_start.into(),
        }
    }

    /// Number of lines in the buffer (at least 1, even for an empty buffer).
    #[must_use]
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.line_starts.len()).unwrap_or(u32::MAX)
    }

    /// Byte offset of the start of `row`, if it exists.
    #[must_use]
    pub fn line_start(&self, row: u32) -> Option<TextSize> {
        self.line_starts.get(row as usize).copied()
    }

    #[must_use]
    pub const fn text_len(&self) -> TextSize {
        self.text_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_line_endings() {
        let index = LineIndex::new("one\ntwo\nthree");
        assert_eq!(index.point(TextSize::from(0)), Point::new(0, 0));
        assert_eq!(index.point(TextSize::from(3)), Point::new(0, 3));
        assert_eq!(index.point(TextSize::from(4)), Point::new(1, 0));
        assert_eq!(index.point(TextSize::from(8)), Point::new(2, 0));
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn windows_line_endings() {
        let index = LineIndex::new("one\r\ntwo");
        assert_eq!(index.point(TextSize::from(5)), Point::new(1, 0));
        // the \r belongs to line 0
        assert_eq!(index.point(TextSize::from(3)), Point::new(0, 3));
    }

    #[test]
    fn empty_buffer() {
        let index = LineIndex::new("");
        assert_eq!(index.point(TextSize::zero()), Point::new(0, 0));
        assert_eq!(index.line_count(), 1);
    }

    #[test]
    fn offset_past_end_is_clamped() {
        let index = LineIndex::new("ab");
        assert_eq!(index.point(TextSize::from(100)), Point::new(0, 2));
    }

    #[test]
    fn multibyte_columns_are_bytes() {
        let index = LineIndex::new("café\nx");
        assert_eq!(index.point(TextSize::from(5)), Point::new(0, 5));
        assert_eq!(index.point(TextSize::from(6)), Point::new(1, 0));
    }

    #[test]
    fn line_starts_lookup() {
        let index = LineIndex::new("a\nbb\nccc");
        assert_eq!(index.line_start(0), Some(TextSize::from(0)));
        assert_eq!(index.line_start(1), Some(TextSize::from(2)));
        assert_eq!(index.line_start(2), Some(TextSize::from(5)));
        assert_eq!(index.line_start(3), None);
    }
}
