//! Stateful tree traversal.
//!
//! A [`TreeCursor`] keeps the path from the root to the current element, so
//! every move is O(1) in tree depth and parent navigation needs no parent
//! pointers in the green tree itself.

use crate::syntax::green::GreenNode;
use crate::syntax::node::{SyntaxElement, SyntaxNode};
use crate::syntax::TextSize;
use std::sync::Arc;

struct Frame<'a> {
    parent: &'a Arc<GreenNode>,
    /// Index of the current child within `parent`.
    index: usize,
    /// Absolute offset of the current child.
    offset: TextSize,
}

/// A movable position within a syntax tree.
pub struct TreeCursor<'a> {
    root: &'a Arc<GreenNode>,
    path: Vec<Frame<'a>>,
}

impl<'a> TreeCursor<'a> {
    pub(crate) fn new(root: &'a Arc<GreenNode>) -> Self {
        Self {
            root,
            path: Vec::new(),
        }
    }

    /// The element the cursor currently points at.
    #[must_use]
    pub fn element(&self) -> SyntaxElement<'a> {
        match self.path.last() {
            None => SyntaxElement::Node(SyntaxNode::new(self.root, TextSize::zero())),
            Some(frame) => {
                let child = &frame.parent.children()[frame.index];
                SyntaxElement::new(child, frame.offset)
            }
        }
    }

    /// Current element as a node, if it is one.
    #[must_use]
    pub fn node(&self) -> Option<SyntaxNode<'a>> {
        self.element().as_node().copied()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Move to the first child. Returns `false` (and stays put) on tokens and
    /// childless nodes.
    pub fn goto_first_child(&mut self) -> bool {
        let current = self.element();
        let Some(node) = current.as_node() else {
            return false;
        };
        if node.child_count() == 0 {
            return false;
        }
        self.path.push(Frame {
            parent: node.green(),
            index: 0,
            offset: node.range().start(),
        });
        true
    }

    /// Move to the next sibling. Returns `false` at the last child and at the
    /// root.
    pub fn goto_next_sibling(&mut self) -> bool {
        let Some(frame) = self.path.last_mut() else {
            return false;
        };
        let children = frame.parent.children();
        if frame.index + 1 >= children.len() {
            return false;
        }
        frame.offset += children[frame.index].text_len();
        frame.index += 1;
        true
    }

    /// Move to the first child whose range extends past `byte`. Returns
    /// `false` on tokens, childless nodes, and when `byte` is at or beyond
    /// the current node's end.
    pub fn goto_first_child_for_byte(&mut self, byte: TextSize) -> bool {
        let current = self.element();
        let Some(node) = current.as_node() else {
            return false;
        };
        let mut offset = node.range().start();
        for (index, child) in node.green().children().iter().enumerate() {
            let end = offset + child.text_len();
            if end > byte {
                self.path.push(Frame {
                    parent: node.green(),
                    index,
                    offset,
                });
                return true;
            }
            offset = end;
        }
        false
    }

    /// Descend to the deepest element whose range extends past `byte`.
    pub fn descend_to_byte(&mut self, byte: TextSize) {
        while self.goto_first_child_for_byte(byte) {}
    }

    /// Move to the parent. Returns `false` at the root.
    pub fn goto_parent(&mut self) -> bool {
        self.path.pop().is_some()
    }
}
