//! Edit-driven reparsing: reuse, equivalence with scratch parses, and the
//! zero-edit fast path.

use sprig::syntax::GreenNode;
use sprig::testing::grammars;
use sprig::{InputEdit, ParseStatus, Parser, SyntaxElement, SyntaxTree, TextRange};
use std::sync::Arc;

fn arithmetic_parser() -> Parser {
    Parser::new(grammars::arithmetic())
}

/// Green node at a child-index path from the root.
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
fn appending_reuses_the_untouched_left_operand() {
    let mut parser = arithmetic_parser();
    let old = parser.parse("1+2", None);
    assert_eq!(old.status(), ParseStatus::Ok);

    let mut edited = old.clone();
    edited.edit(InputEdit::insert(3u32, 1u32));
    let new = parser.parse("1+23", Some(&edited));

    assert_eq!(new.status(), ParseStatus::Ok);
    assert_eq!(new.text(), "1+23");

    // The "1" operand is shared by reference with the old tree.
    assert!(Arc::ptr_eq(green_at(&old, &[0]), green_at(&new, &[0])));

    // And the result is indistinguishable from a scratch parse.
    let scratch = arithmetic_parser().parse("1+23", None);
    assert_eq!(new.green_root(), scratch.green_root());
}

#[test]
fn editing_the_left_edge_reuses_right_operands() {
    let mut parser = arithmetic_parser();
    let old = parser.parse("1+2*3", None);

    let mut edited = old.clone();
    edited.edit(InputEdit::new(0u32, 1u32, 1u32));
    let new = parser.parse("7+2*3", Some(&edited));

    assert_eq!(new.status(), ParseStatus::Ok);
    assert_eq!(new.text(), "7+2*3");

    // The "2" deep inside the multiplication is shared.
    assert!(Arc::ptr_eq(green_at(&old, &[2, 0]), green_at(&new, &[2, 0])));

    let scratch = arithmetic_parser().parse("7+2*3", None);
    assert_eq!(new.green_root(), scratch.green_root());
}

#[test]
fn deleting_in_the_middle_reuses_later_subtrees() {
    let mut parser = arithmetic_parser();
    let old = parser.parse("12+3+4", None);

    let mut edited = old.clone();
    edited.edit(InputEdit::delete(TextRange::new(1.into(), 2.into())));
    let new = parser.parse("1+3+4", Some(&edited));

    assert_eq!(new.status(), ParseStatus::Ok);
    assert_eq!(new.text(), "1+3+4");

    // "3" sits past the edit window with room to spare; it is shared.
    assert!(Arc::ptr_eq(green_at(&old, &[0, 2]), green_at(&new, &[0, 2])));

    let scratch = arithmetic_parser().parse("1+3+4", None);
    assert_eq!(new.green_root(), scratch.green_root());
}

#[test]
fn zero_edits_and_same_length_return_the_previous_tree() {
    let mut parser = arithmetic_parser();
    let old = parser.parse("1+2*3", None);
    let new = parser.parse("1+2*3", Some(&old));
    assert!(Arc::ptr_eq(old.green_root(), new.green_root()));
}

#[test]
fn composed_edits_map_positions_through_both() {
    let mut parser = arithmetic_parser();
    let old = parser.parse("1+2", None);

    let mut edited = old.clone();
    // "1+2" -> "10+2" -> "10+23"
    edited.edit(InputEdit::insert(1u32, 1u32));
    edited.edit(InputEdit::insert(4u32, 1u32));
    let new = parser.parse("10+23", Some(&edited));

    assert_eq!(new.status(), ParseStatus::Ok);
    assert_eq!(new.text(), "10+23");

    let scratch = arithmetic_parser().parse("10+23", None);
    assert_eq!(new.green_root(), scratch.green_root());
}

#[test]
fn incremental_matches_scratch_across_edit_shapes() {
    let base = "1+2*3+4";
    let cases: &[(InputEdit, &str)] = &[
        (InputEdit::insert(0u32, 1u32), "91+2*3+4"),
        (InputEdit::delete(TextRange::new(5.into(), 7.into())), "1+2*3"),
        (InputEdit::new(3u32, 4u32, 4u32), "1+2+3+4"),
        (InputEdit::insert(7u32, 2u32), "1+2*3+412"),
        (InputEdit::new(2u32, 3u32, 7u32), "1+(9*8)*3+4"),
    ];

    for (edit, new_text) in cases {
        let mut parser = arithmetic_parser();
        let mut old = parser.parse(base, None);
        old.edit(*edit);
        let incremental = parser.parse(new_text, Some(&old));
        let scratch = arithmetic_parser().parse(new_text, None);

        assert_eq!(incremental.text(), *new_text);
        assert_eq!(incremental.status(), scratch.status(), "{new_text:?}");
        assert_eq!(
            incremental.green_root(),
            scratch.green_root(),
            "{new_text:?}"
        );
    }
}

#[test]
fn incremental_reparse_of_broken_input_matches_scratch() {
    let mut parser = arithmetic_parser();
    let mut old = parser.parse("1+2", None);

    // Turn "1+2" into "1+2+": the error appears after the edit.
    old.edit(InputEdit::insert(3u32, 1u32));
    let incremental = parser.parse("1+2+", Some(&old));
    let scratch = arithmetic_parser().parse("1+2+", None);

    assert_eq!(incremental.status(), ParseStatus::ErrorsPresent);
    assert_eq!(incremental.text(), "1+2+");
    assert_eq!(incremental.green_root(), scratch.green_root());
}

#[test]
fn reparsing_after_fixing_an_error_clears_the_status() {
    let mut parser = arithmetic_parser();
    let mut old = parser.parse("1+", None);
    assert_eq!(old.status(), ParseStatus::ErrorsPresent);

    old.edit(InputEdit::insert(2u32, 1u32));
    let new = parser.parse("1+2", Some(&old));
    assert_eq!(new.status(), ParseStatus::Ok);
    assert_eq!(new.text(), "1+2");
}
