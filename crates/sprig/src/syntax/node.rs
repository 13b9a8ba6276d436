//! Borrowed red-layer handles over the green tree.
//!
//! A [`SyntaxNode`] pairs a green node with the absolute offset derived while
//! walking down from the root. Handles are `Copy` and borrow the tree; they
//! cost nothing to create and never allocate.

use crate::language::SymbolId;
use crate::syntax::green::{GreenElement, GreenNode, GreenToken};
use crate::syntax::{TextRange, TextSize};
use std::sync::Arc;

/// A positioned interior node.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'a> {
    green: &'a Arc<GreenNode>,
    offset: TextSize,
}

/// A positioned leaf token.
#[derive(Clone, Copy)]
pub struct SyntaxToken<'a> {
    green: &'a GreenToken,
    offset: TextSize,
}

/// Either kind of positioned child.
#[derive(Clone, Copy)]
pub enum SyntaxElement<'a> {
    Node(SyntaxNode<'a>),
    Token(SyntaxToken<'a>),
}

impl<'a> SyntaxNode<'a> {
    pub(crate) const fn new(green: &'a Arc<GreenNode>, offset: TextSize) -> Self {
        Self { green, offset }
    }

    /// The underlying shared green node.
    #[must_use]
    pub const fn green(&self) -> &'a Arc<GreenNode> {
        self.green
    }

    #[must_use]
    pub fn symbol(&self) -> SymbolId {
        self.green.symbol()
    }

    #[must_use]
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.text_len())
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.green.is_error()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.green.has_error()
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.green.child_count()
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<SyntaxElement<'a>> {
        let children = self.green.children();
        let element = children.get(index)?;
        let mut offset = self.offset;
        for earlier in &children[..index] {
            offset += earlier.text_len();
        }
        Some(SyntaxElement::new(element, offset))
    }

    /// Children in source order, with absolute offsets.
    pub fn children(&self) -> impl Iterator<Item = SyntaxElement<'a>> + 'a {
        let mut offset = self.offset;
        self.green.children().iter().map(move |element| {
            let positioned = SyntaxElement::new(element, offset);
            offset += element.text_len();
            positioned
        })
    }

    /// This node and every descendant, preorder.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxElement<'a>> {
        let mut pending = vec![SyntaxElement::Node(*self)];
        std::iter::from_fn(move || {
            let next = pending.pop()?;
            if let SyntaxElement::Node(node) = &next {
                let children: Vec<_> = node.children().collect();
                pending.extend(children.into_iter().rev());
            }
            Some(next)
        })
    }

    /// Reconstruct the source text this node covers.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for element in self.descendants() {
            if let SyntaxElement::Token(token) = element {
                out.push_str(token.text());
            }
        }
        out
    }
}

impl<'a> SyntaxToken<'a> {
    pub(crate) const fn new(green: &'a GreenToken, offset: TextSize) -> Self {
        Self { green, offset }
    }

    #[must_use]
    pub const fn green(&self) -> &'a GreenToken {
        self.green
    }

    #[must_use]
    pub const fn symbol(&self) -> SymbolId {
        self.green.symbol()
    }

    #[must_use]
    pub fn text(&self) -> &'a str {
        self.green.text()
    }

    #[must_use]
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.text_len())
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.green.is_error()
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.green.is_missing()
    }
}

impl<'a> SyntaxElement<'a> {
    pub(crate) const fn new(element: &'a GreenElement, offset: TextSize) -> Self {
        match element {
            GreenElement::Node(node) => Self::Node(SyntaxNode::new(node, offset)),
            GreenElement::Token(token) => Self::Token(SyntaxToken::new(token, offset)),
        }
    }

    #[must_use]
    pub fn symbol(&self) -> SymbolId {
        match self {
            Self::Node(node) => node.symbol(),
            Self::Token(token) => token.symbol(),
        }
    }

    #[must_use]
    pub fn range(&self) -> TextRange {
        match self {
            Self::Node(node) => node.range(),
            Self::Token(token) => token.range(),
        }
    }

    #[must_use]
    pub const fn as_node(&self) -> Option<&SyntaxNode<'a>> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub const fn as_token(&self) -> Option<&SyntaxToken<'a>> {
        match self {
            Self::Node(_) => None,
            Self::Token(token) => Some(token),
        }
    }
}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{}", self.symbol(), self.range())
    }
}

impl std::fmt::Debug for SyntaxToken<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{} {:?}", self.symbol(), self.range(), self.text())
    }
}

impl std::fmt::Debug for SyntaxElement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(node) => node.fmt(f),
            Self::Token(token) => token.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::StateId;

    fn sample() -> Arc<GreenNode> {
        let inner = GreenNode::new(
            SymbolId(11),
            vec![
                GreenToken::new(SymbolId(1), "2").into(),
                GreenToken::new(SymbolId(2), "*").into(),
                GreenToken::new(SymbolId(1), "3").into(),
            ],
            StateId::START,
        );
        GreenNode::new(
            SymbolId(10),
            vec![
                GreenToken::new(SymbolId(1), "1").into(),
                GreenToken::new(SymbolId(3), "+").into(),
                inner.into(),
            ],
            StateId::START,
        )
    }

    #[test]
    fn ranges_tile_the_buffer() {
        let green = sample();
        let root = SyntaxNode::new(&green, TextSize::zero());
        assert_eq!(root.range(), TextRange::new(TextSize::zero(), 5.into()));

        let ranges: Vec<_> = root.children().map(|child| child.range()).collect();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0], TextRange::new(0.into(), 1.into()));
        assert_eq!(ranges[1], TextRange::new(1.into(), 2.into()));
        assert_eq!(ranges[2], TextRange::new(2.into(), 5.into()));
    }

    #[test]
    fn text_round_trips() {
        let green = sample();
        let root = SyntaxNode::new(&green, TextSize::zero());
        assert_eq!(root.text(), "1+2*3");
    }

    #[test]
    fn child_by_index_matches_iteration() {
        let green = sample();
        let root = SyntaxNode::new(&green, TextSize::zero());
        for (index, child) in root.children().enumerate() {
            let by_index = root.child(index).expect("in range");
            assert_eq!(by_index.range(), child.range());
            assert_eq!(by_index.symbol(), child.symbol());
        }
        assert!(root.child(3).is_none());
    }

    #[test]
    fn descendants_visit_preorder() {
        let green = sample();
        let root = SyntaxNode::new(&green, TextSize::zero());
        let symbols: Vec<u16> = root.descendants().map(|e| e.symbol().0).collect();
        assert_eq!(symbols, vec![10, 1, 3, 11, 1, 2, 1]);
    }
}
