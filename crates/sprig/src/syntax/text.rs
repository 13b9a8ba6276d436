#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text size in bytes (UTF-8)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TextSize(u32);

/// Half-open byte range `[start, end)` in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TextRange {
    start: TextSize,
    end: TextSize,
}

/// A zero-based line/column position.
///
/// Columns are measured in UTF-8 bytes from the line start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

/// A pair of points delimiting a span of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct PointRange {
    pub start: Point,
    pub end: Point,
}

impl TextSize {
    #[must_use]
    pub const fn from(offset: u32) -> Self {
        Self(offset)
    }

    #[must_use]
    pub const fn into(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Byte length of a string slice as a `TextSize`.
    ///
    /// Saturates at `u32::MAX`; buffers larger than 4 GiB are not supported.
    #[must_use]
    pub fn of(text: &str) -> Self {
        Self(u32::try_from(text.len()).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl From<u32> for TextSize {
    fn from(offset: u32) -> Self {
        Self(offset)
    }
}

impl From<TextSize> for u32 {
    fn from(size: TextSize) -> Self {
        size.0
    }
}

impl From<TextSize> for usize {
    fn from(size: TextSize) -> Self {
        size.0 as usize
    }
}

impl std::ops::Add<Self> for TextSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign<Self> for TextSize {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub<Self> for TextSize {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for TextSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TextRange {
    #[must_use]
    pub const fn new(start: TextSize, end: TextSize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn at(start: TextSize, len: TextSize) -> Self {
        Self::new(start, TextSize(start.0 + len.0))
    }

    #[must_use]
    pub const fn empty(offset: TextSize) -> Self {
        Self::new(offset, offset)
    }

    #[must_use]
    pub const fn start(self) -> TextSize {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> TextSize {
        self.end
    }

    #[must_use]
    pub const fn len(self) -> TextSize {
        TextSize(self.end.0 - self.start.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    #[must_use]
    pub const fn contains(self, offset: TextSize) -> bool {
        offset.0 >= self.start.0 && offset.0 < self.end.0
    }

    #[must_use]
    pub const fn contains_range(self, other: Self) -> bool {
        other.start.0 >= self.start.0 && other.end.0 <= self.end.0
    }

    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let start = self.start.0.max(other.start.0);
        let end = self.end.0.min(other.end.0);

        if start < end {
            Some(Self::new(TextSize(start), TextSize(end)))
        } else {
            None
        }
    }

    /// Whether two ranges share at least one byte, or touch when one is empty.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.start.0 < other.end.0 && other.start.0 < self.end.0
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}

impl Point {
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self { row: 0, column: 0 }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

impl PointRange {
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_size_arithmetic() {
        let a = TextSize::from(10);
        let b = TextSize::from(4);
        assert_eq!((a + b).into(), 14);
        assert_eq!((a - b).into(), 6);
        assert_eq!(b.saturating_sub(a), TextSize::zero());

        let mut c = a;
        c += b;
        assert_eq!(c.into(), 14);
    }

    #[test]
    fn text_size_of_str() {
        assert_eq!(TextSize::of("café"), TextSize::from(5));
        assert_eq!(TextSize::of(""), TextSize::zero());
    }

    #[test]
    fn range_containment() {
        let range = TextRange::new(TextSize::from(10), TextSize::from(20));
        assert!(range.contains(TextSize::from(10)));
        assert!(range.contains(TextSize::from(19)));
        assert!(!range.contains(TextSize::from(20)));
        assert!(range.contains_range(TextRange::new(TextSize::from(12), TextSize::from(18))));
        assert!(!range.contains_range(TextRange::new(TextSize::from(5), TextSize::from(12))));
    }

    #[test]
    fn range_intersection() {
        let a = TextRange::new(TextSize::from(0), TextSize::from(10));
        let b = TextRange::new(TextSize::from(5), TextSize::from(15));
        let c = TextRange::new(TextSize::from(10), TextSize::from(12));

        assert_eq!(
            a.intersect(b),
            Some(TextRange::new(TextSize::from(5), TextSize::from(10)))
        );
        assert!(a.intersect(c).is_none());
        assert!(a.intersects(b));
        assert!(!a.intersects(c));
    }

    #[test]
    fn point_ordering() {
        assert!(Point::new(0, 5) < Point::new(1, 0));
        assert!(Point::new(2, 3) < Point::new(2, 4));
    }
}
