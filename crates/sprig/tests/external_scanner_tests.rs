//! External scanner integration: scanner-produced tokens, declined scans,
//! and scanner state across incremental reparses.

use sprig::syntax::GreenNode;
use sprig::testing::{grammars, sexp};
use sprig::{InputEdit, ParseStatus, Parser, SyntaxElement, SyntaxTree};
use std::sync::Arc;

fn parser() -> Parser {
    Parser::new(grammars::words_and_blobs())
}

fn green_at<'t>(tree: &'t SyntaxTree, path: &[usize]) -> &'t Arc<GreenNode> {
    let mut node = tree.root();
    for &index in path {
        node = match node.child(index) {
            Some(SyntaxElement::Node(child)) => child,
            other => panic!("expected a node at index {index}, found {other:?}"),
        };
    }
    node.green()
}

#[test]
fn scanner_tokens_mix_with_static_tokens() {
    let tree = parser().parse("ab {cd {x}} ef", None);
    assert_eq!(tree.status(), ParseStatus::Ok);
    assert_eq!(tree.text(), "ab {cd {x}} ef");
    assert_eq!(
        sexp(&tree),
        "(doc (doc (doc (item word)) (item blob)) (item word))"
    );
}

#[test]
fn nested_braces_stay_one_token() {
    let tree = parser().parse("{a {b {c}} d}", None);
    assert_eq!(tree.status(), ParseStatus::Ok);
    assert_eq!(sexp(&tree), "(doc (item blob))");
}

#[test]
fn adjacent_blobs_parse_independently() {
    let tree = parser().parse("{a} {b}", None);
    assert_eq!(tree.status(), ParseStatus::Ok);
    assert_eq!(sexp(&tree), "(doc (doc (item blob)) (item blob))");
}

#[test]
fn declined_scan_falls_back_to_recovery() {
    // The scanner refuses an unterminated blob, so the brace surfaces as an
    // invalid token inside an error node.
    let tree = parser().parse("{ab", None);
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    assert_eq!(tree.text(), "{ab");
    assert_eq!(sexp(&tree), "(doc (ERROR ERROR) (doc (item word)))");
}

#[test]
fn incremental_reuse_carries_scanner_state() {
    let mut parser = parser();
    let old = parser.parse("aa {bb} cc", None);
    assert_eq!(old.status(), ParseStatus::Ok);

    let mut edited = old.clone();
    edited.edit(InputEdit::new(9u32, 10u32, 10u32));
    let new = parser.parse("aa {bb} cd", Some(&edited));

    assert_eq!(new.status(), ParseStatus::Ok);
    assert_eq!(new.text(), "aa {bb} cd");

    // Everything left of the edit, blob included, is shared by reference.
    assert!(Arc::ptr_eq(green_at(&old, &[0]), green_at(&new, &[0])));

    let scratch = Parser::new(grammars::words_and_blobs()).parse("aa {bb} cd", None);
    assert_eq!(new.green_root(), scratch.green_root());
}

#[test]
fn editing_inside_a_blob_rebuilds_it() {
    let mut parser = parser();
    let old = parser.parse("{aa} x", None);

    let mut edited = old.clone();
    edited.edit(InputEdit::insert(2u32, 1u32));
    let new = parser.parse("{aba} x", Some(&edited));

    assert_eq!(new.status(), ParseStatus::Ok);
    assert_eq!(new.text(), "{aba} x");

    let scratch = Parser::new(grammars::words_and_blobs()).parse("{aba} x", None);
    assert_eq!(new.green_root(), scratch.green_root());
}
