//! Buffer edit descriptions.

use crate::syntax::{TextRange, TextSize};

/// One contiguous replacement in the source buffer.
///
/// `start` and `old_end` are offsets into the buffer before the edit;
/// `new_end` is an offset into the buffer after it. When several edits are
/// recorded against one tree, each is expressed in the coordinates produced
/// by applying the edits recorded before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct InputEdit {
    pub start: TextSize,
    pub old_end: TextSize,
    pub new_end: TextSize,
}

impl InputEdit {
    /// # Panics
    ///
    /// Panics when `start` exceeds either end offset. Test-facing
    /// constructor; use the struct literal if the offsets are already known
    /// to be ordered.
    #[must_use]
    pub fn new(
        start: impl Into<TextSize>,
        old_end: impl Into<TextSize>,
        new_end: impl Into<TextSize>,
    ) -> Self {
        let (start, old_end, new_end) = (start.into(), old_end.into(), new_end.into());
        assert!(start <= old_end, "edit start past old end");
        assert!(start <= new_end, "edit start past new end");
        Self {
            start,
            old_end,
            new_end,
        }
    }

    /// Insertion of `len` bytes at `offset`.
    #[must_use]
    pub fn insert(offset: impl Into<TextSize>, len: impl Into<TextSize>) -> Self {
        let offset = offset.into();
        Self {
            start: offset,
            old_end: offset,
            new_end: offset + len.into(),
        }
    }

    /// Deletion of the given range of the old buffer.
    #[must_use]
    pub fn delete(range: TextRange) -> Self {
        Self {
            start: range.start(),
            old_end: range.end(),
            new_end: range.start(),
        }
    }

    /// Replaced range in old-buffer coordinates.
    #[must_use]
    pub const fn old_range(&self) -> TextRange {
        TextRange::new(self.start, self.old_end)
    }

    /// Replacement range in new-buffer coordinates.
    #[must_use]
    pub const fn new_range(&self) -> TextRange {
        TextRange::new(self.start, self.new_end)
    }

    /// Signed length change.
    #[must_use]
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.new_end)) - i64::from(u32::from(self.old_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_delete_shapes() {
        let insert = InputEdit::insert(3u32, 2u32);
        assert_eq!(insert.old_range().len(), TextSize::zero());
        assert_eq!(insert.new_range(), TextRange::new(3.into(), 5.into()));
        assert_eq!(insert.delta(), 2);

        let delete = InputEdit::delete(TextRange::new(1.into(), 4.into()));
        assert_eq!(delete.new_range().len(), TextSize::zero());
        assert_eq!(delete.delta(), -3);
    }

    #[test]
    #[should_panic(expected = "edit start past old end")]
    fn rejects_inverted_edit() {
        let _ = InputEdit::new(5u32, 2u32, 6u32);
    }
}
