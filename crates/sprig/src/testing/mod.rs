//! # Test fixtures
//!
//! Everything the engine's tests (and downstream experiments) need to get a
//! [`Language`](crate::Language) without real grammar tooling: a pattern
//! compiler for lex tables, an SLR(1) builder for parse tables, a few
//! ready-made fixture grammars, and an S-expression dump for asserting tree
//! shapes.

pub mod grammars;
mod lex;
mod slr;

pub use lex::{build_lex_table, Pattern};
pub use slr::GrammarBuilder;

use crate::syntax::{SyntaxElement, SyntaxTree};

/// Render a tree as a compact S-expression, skipping trivia.
///
/// Nodes become `(name …)`, tokens their symbol name, missing tokens
/// `(MISSING name)`. Error nodes print as `(ERROR …)`.
#[must_use]
pub fn sexp(tree: &SyntaxTree) -> String {
    let mut out = String::new();
    write_element(tree, SyntaxElement::Node(tree.root()), &mut out);
    out
}

fn write_element(tree: &SyntaxTree, element: SyntaxElement<'_>, out: &mut String) {
    match element {
        SyntaxElement::Node(node) => {
            out.push('(');
            out.push_str(tree.language().symbol_name(node.symbol()));
            for child in node.children() {
                let is_trivia = child
                    .as_token()
                    .is_some_and(|token| tree.language().is_trivia(token.symbol()));
                if is_trivia {
                    continue;
                }
                out.push(' ');
                write_element(tree, child, out);
            }
            out.push(')');
        }
        SyntaxElement::Token(token) => {
            if token.is_missing() {
                out.push_str("(MISSING ");
                out.push_str(tree.language().symbol_name(token.symbol()));
                out.push(')');
            } else {
                out.push_str(tree.language().symbol_name(token.symbol()));
            }
        }
    }
}
