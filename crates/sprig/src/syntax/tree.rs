//! The owning tree handle returned by a parse.

use crate::error::{LexError, ParseStatus};
use crate::incremental::InputEdit;
use crate::language::LanguageRef;
use crate::syntax::cursor::TreeCursor;
use crate::syntax::green::GreenNode;
use crate::syntax::line_col::LineIndex;
use crate::syntax::node::{SyntaxElement, SyntaxNode};
use crate::syntax::{Point, PointRange, TextRange, TextSize};
use std::sync::Arc;

/// An immutable parse result.
///
/// Cloning is cheap: the green root and the language descriptor are shared.
/// The tree always tiles `[0, text_len)` regardless of status; errors live
/// inside it as error and missing nodes rather than failing the parse.
#[derive(Clone)]
pub struct SyntaxTree {
    root: Arc<GreenNode>,
    language: LanguageRef,
    line_index: LineIndex,
    status: ParseStatus,
    lex_errors: Vec<LexError>,
    edits: Vec<InputEdit>,
}

impl SyntaxTree {
    pub(crate) fn new(
        root: Arc<GreenNode>,
        language: LanguageRef,
        line_index: LineIndex,
        status: ParseStatus,
        lex_errors: Vec<LexError>,
    ) -> Self {
        Self {
            root,
            language,
            line_index,
            status,
            lex_errors,
            edits: Vec::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode::new(&self.root, TextSize::zero())
    }

    #[must_use]
    pub const fn green_root(&self) -> &Arc<GreenNode> {
        &self.root
    }

    #[must_use]
    pub fn cursor(&self) -> TreeCursor<'_> {
        TreeCursor::new(&self.root)
    }

    #[must_use]
    pub const fn language(&self) -> &LanguageRef {
        &self.language
    }

    #[must_use]
    pub const fn status(&self) -> ParseStatus {
        self.status
    }

    #[must_use]
    pub fn text_len(&self) -> TextSize {
        self.root.text_len()
    }

    /// Reconstruct the full source text from the tokens.
    #[must_use]
    pub fn text(&self) -> String {
        self.root().text()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    /// Lexical faults recorded while this tree was parsed, in source order.
    /// Each corresponds to an invalid token leaf somewhere in the tree.
    #[must_use]
    pub fn lex_errors(&self) -> &[LexError] {
        &self.lex_errors
    }

    /// Ranges of error and missing elements, in source order. Does not
    /// descend into an error node's own children.
    #[must_use]
    pub fn error_ranges(&self) -> Vec<TextRange> {
        let mut out = Vec::new();
        collect_errors(SyntaxElement::Node(self.root()), &mut out);
        out
    }

    /// Line/column for an offset, per the buffer this tree was parsed from.
    #[must_use]
    pub fn point_at(&self, offset: TextSize) -> Point {
        self.line_index.point(offset)
    }

    /// Line/column span for a byte range, such as a node's
    /// [`range`](SyntaxNode::range).
    #[must_use]
    pub fn point_range(&self, range: TextRange) -> PointRange {
        PointRange::new(
            self.line_index.point(range.start()),
            self.line_index.point(range.end()),
        )
    }

    #[must_use]
    pub const fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Record an edit so a later reparse can map old positions to new ones.
    ///
    /// The tree itself is not restructured; recorded edits only steer reuse
    /// when this tree is passed back to a parser.
    pub fn edit(&mut self, edit: InputEdit) {
        self.edits.push(edit);
    }

    #[must_use]
    pub fn edits(&self) -> &[InputEdit] {
        &self.edits
    }
}

fn collect_errors(element: SyntaxElement<'_>, out: &mut Vec<TextRange>) {
    match element {
        SyntaxElement::Node(node) => {
            if node.is_error() {
                out.push(node.range());
                return;
            }
            if !node.has_error() {
                return;
            }
            for child in node.children() {
                collect_errors(child, out);
            }
        }
        SyntaxElement::Token(token) => {
            if token.is_error() || token.is_missing() {
                out.push(token.range());
            }
        }
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("text_len", &self.text_len())
            .field("status", &self.status)
            .field("edits", &self.edits.len())
            .finish()
    }
}
