//! Immutable, shareable green tree.
//!
//! Nodes store lengths rather than absolute offsets, so a subtree reused
//! between an old and a new tree never needs its ranges rewritten; the red
//! layer derives absolute ranges while walking. Nodes are reference-counted;
//! sharing a subtree between trees is an `Arc` clone, never a copy.

use crate::language::{ScannerSnapshot, StateId, SymbolId};
use crate::syntax::TextSize;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::sync::Arc;

/// Per-node flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const NONE: Self = Self(0);
    /// The node itself marks unparseable input.
    pub const ERROR: Self = Self(1);
    /// Zero-length token synthesized where the grammar required one.
    pub const MISSING: Self = Self(2);
    /// Some descendant (or the node itself) is an error.
    pub const HAS_ERROR: Self = Self(4);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A leaf of the green tree: one classified span of source bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GreenToken {
    symbol: SymbolId,
    text: CompactString,
    flags: NodeFlags,
}

impl GreenToken {
    #[must_use]
    pub fn new(symbol: SymbolId, text: impl Into<CompactString>) -> Self {
        Self {
            symbol,
            text: text.into(),
            flags: NodeFlags::NONE,
        }
    }

    /// Synthetic token for bytes no rule matched.
    #[must_use]
    pub fn invalid(text: impl Into<CompactString>) -> Self {
        Self {
            symbol: SymbolId::ERROR,
            text: text.into(),
            flags: NodeFlags::ERROR.union(NodeFlags::HAS_ERROR),
        }
    }

    /// Zero-length placeholder for a token the grammar required but the
    /// input lacked.
    #[must_use]
    pub const fn missing(symbol: SymbolId) -> Self {
        Self {
            symbol,
            text: CompactString::const_new(""),
            flags: NodeFlags(NodeFlags::MISSING.0 | NodeFlags::HAS_ERROR.0),
        }
    }

    #[inline]
    #[must_use]
    pub const fn symbol(&self) -> SymbolId {
        self.symbol
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn text_len(&self) -> TextSize {
        TextSize::of(&self.text)
    }

    #[must_use]
    pub const fn flags(&self) -> NodeFlags {
        self.flags
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.flags.contains(NodeFlags::ERROR)
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.flags.contains(NodeFlags::MISSING)
    }
}

/// Children storage specialized for the common shapes.
#[derive(Debug, Clone)]
enum GreenChildren {
    Empty,
    One(Box<GreenElement>),
    /// 2-4 children inline, no extra allocation beyond the elements.
    Inline(SmallVec<[GreenElement; 4]>),
    Many(Arc<[GreenElement]>),
}

const INLINE_CHILDREN_THRESHOLD: usize = 4;

/// An interior node of the green tree.
///
/// `parse_state`, `lookahead_bytes` and `scanner_snapshot` exist only for the
/// reconciler's reuse check; they do not participate in equality or hashing,
/// so an incrementally produced tree compares equal to its from-scratch
/// counterpart.
#[derive(Debug)]
pub struct GreenNode {
    symbol: SymbolId,
    text_len: TextSize,
    flags: NodeFlags,
    /// Automaton state in which this node's first token was shifted.
    parse_state: StateId,
    /// How far past the node's end the scanner looked while building it.
    lookahead_bytes: u32,
    /// External-scanner states at the node's boundaries, when the language
    /// has an external scanner.
    scanner_snapshot: Option<Arc<ScannerSnapshot>>,
    children: GreenChildren,
}

/// Either child of a green node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreenElement {
    Node(Arc<GreenNode>),
    Token(GreenToken),
}

impl GreenNode {
    /// Build a node from children in source order.
    ///
    /// The text length is the sum of the children's lengths and `HAS_ERROR`
    /// propagates upward, so range-tiling and error queries never need a
    /// second pass.
    #[must_use]
    pub fn new(
        symbol: SymbolId,
        children: Vec<GreenElement>,
        parse_state: StateId,
    ) -> Arc<Self> {
        Self::with_metadata(symbol, children, parse_state, 0, None, NodeFlags::NONE)
    }

    /// Build an error node wrapping arbitrary elements.
    #[must_use]
    pub fn error(children: Vec<GreenElement>, parse_state: StateId) -> Arc<Self> {
        Self::with_metadata(
            SymbolId::ERROR,
            children,
            parse_state,
            0,
            None,
            NodeFlags::ERROR,
        )
    }

    #[must_use]
    pub(crate) fn with_metadata(
        symbol: SymbolId,
        children: Vec<GreenElement>,
        parse_state: StateId,
        lookahead_bytes: u32,
        scanner_snapshot: Option<Arc<ScannerSnapshot>>,
        extra_flags: NodeFlags,
    ) -> Arc<Self> {
        let mut text_len = TextSize::zero();
        let mut flags = extra_flags;
        for child in &children {
            text_len += child.text_len();
            if child.has_error() {
                flags = flags.union(NodeFlags::HAS_ERROR);
            }
        }
        if flags.contains(NodeFlags::ERROR) || flags.contains(NodeFlags::MISSING) {
            flags = flags.union(NodeFlags::HAS_ERROR);
        }

        let children = match children.len() {
            0 => GreenChildren::Empty,
            1 => GreenChildren::One(Box::new(children.into_iter().next().expect("one child"))),
            2..=INLINE_CHILDREN_THRESHOLD => GreenChildren::Inline(children.into_iter().collect()),
            _ => GreenChildren::Many(children.into()),
        };

        Arc::new(Self {
            symbol,
            text_len,
            flags,
            parse_state,
            lookahead_bytes,
            scanner_snapshot,
            children,
        })
    }

    #[inline]
    #[must_use]
    pub const fn symbol(&self) -> SymbolId {
        self.symbol
    }

    #[inline]
    #[must_use]
    pub const fn text_len(&self) -> TextSize {
        self.text_len
    }

    #[must_use]
    pub fn children(&self) -> &[GreenElement] {
        match &self.children {
            GreenChildren::Empty => &[],
            GreenChildren::One(child) => std::slice::from_ref(child),
            GreenChildren::Inline(children) => children,
            GreenChildren::Many(children) => children,
        }
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    #[must_use]
    pub const fn flags(&self) -> NodeFlags {
        self.flags
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.flags.contains(NodeFlags::ERROR)
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.flags.contains(NodeFlags::MISSING)
    }

    /// Whether this node or any descendant is an error or missing node.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.flags.contains(NodeFlags::HAS_ERROR)
    }

    #[must_use]
    pub const fn parse_state(&self) -> StateId {
        self.parse_state
    }

    #[must_use]
    pub const fn lookahead_bytes(&self) -> u32 {
        self.lookahead_bytes
    }

    #[must_use]
    pub const fn scanner_snapshot(&self) -> Option<&Arc<ScannerSnapshot>> {
        self.scanner_snapshot.as_ref()
    }
}

// Reuse metadata is an implementation detail of the reconciler; trees built
// incrementally must compare equal to trees built from scratch.
impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.text_len == other.text_len
            && self.flags == other.flags
            && self.children() == other.children()
    }
}

impl Eq for GreenNode {}

impl std::hash::Hash for GreenNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
        self.text_len.hash(state);
        self.flags.hash(state);
        self.children().hash(state);
    }
}

impl std::hash::Hash for GreenElement {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Node(node) => {
                0u8.hash(state);
                node.hash(state);
            }
            Self::Token(token) => {
                1u8.hash(state);
                token.hash(state);
            }
        }
    }
}

impl GreenElement {
    #[must_use]
    pub fn symbol(&self) -> SymbolId {
        match self {
            Self::Node(node) => node.symbol(),
            Self::Token(token) => token.symbol(),
        }
    }

    #[must_use]
    pub fn text_len(&self) -> TextSize {
        match self {
            Self::Node(node) => node.text_len(),
            Self::Token(token) => token.text_len(),
        }
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        match self {
            Self::Node(node) => node.has_error(),
            Self::Token(token) => token.flags().contains(NodeFlags::HAS_ERROR),
        }
    }

    #[must_use]
    pub const fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&Arc<GreenNode>> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub fn as_token(&self) -> Option<&GreenToken> {
        match self {
            Self::Node(_) => None,
            Self::Token(token) => Some(token),
        }
    }
}

impl From<Arc<GreenNode>> for GreenElement {
    fn from(node: Arc<GreenNode>) -> Self {
        Self::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        Self::Token(token)
    }
}
