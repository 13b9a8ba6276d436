//! # Sprig
//!
//! A language-agnostic incremental parsing engine.
//!
//! ## Overview
//!
//! Sprig parses source buffers into concrete syntax trees and keeps those
//! trees cheap to maintain as the buffer is edited:
//!
//! - **Table-driven**: languages are data (symbol table, lex table, parse
//!   table), validated once and shared behind an `Arc`
//! - **Incremental**: record edits on a tree, reparse, and unchanged
//!   subtrees are reused by reference instead of rebuilt
//! - **Lossless**: every tree tiles its buffer exactly; concatenating the
//!   leaves reproduces the source, errors included
//! - **Total**: parse requests never fail; lexical and syntactic errors
//!   become error and missing nodes inside the tree
//! - **Bounded ambiguity**: declared grammar conflicts fork the automaton
//!   within configurable limits, keeping worst-case cost linear
//!
//! ## Quick start
//!
//! ```rust
//! use sprig::{Parser, InputEdit};
//! use sprig::testing::grammars;
//!
//! let mut parser = Parser::new(grammars::arithmetic());
//!
//! let tree = parser.parse("1+2*3", None);
//! assert!(tree.status().is_ok());
//! assert_eq!(tree.text(), "1+2*3");
//!
//! // Edit "1+2*3" into "1+42*3" and reparse incrementally.
//! let mut old = tree.clone();
//! old.edit(InputEdit::new(2u32, 3u32, 4u32));
//! let tree = parser.parse("1+42*3", Some(&old));
//! assert!(tree.status().is_ok());
//! assert_eq!(tree.text(), "1+42*3");
//! ```

pub mod error;
pub mod incremental;
pub mod language;
pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod testing;

pub use error::{LanguageError, LexError, LexErrorKind, ParseStatus};
pub use incremental::InputEdit;
pub use language::{Language, LanguageRef, SymbolId, SymbolKind};
pub use parser::{ForkPolicy, ForkTieBreak, ParseBudget, ParseOptions, Parser};
pub use syntax::{
    Point, PointRange, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTree, TextRange, TextSize,
    TreeCursor,
};
