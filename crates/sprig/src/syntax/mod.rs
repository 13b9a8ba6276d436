//! # Syntax trees
//!
//! Two-layer tree in the persistent style: an immutable, reference-counted
//! green layer that stores lengths and can be shared between trees, and a
//! borrowed red layer that derives absolute ranges on the way down. Leaves
//! carry their text, so concatenating the tokens of any tree reproduces the
//! exact source it was parsed from, errors included.

mod cursor;
mod green;
mod line_col;
mod node;
mod text;
mod tree;

pub use cursor::TreeCursor;
pub use green::{GreenElement, GreenNode, GreenToken, NodeFlags};
pub use line_col::LineIndex;
pub use node::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use text::{Point, PointRange, TextRange, TextSize};
pub use tree::SyntaxTree;
