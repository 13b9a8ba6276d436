//! Error recovery: every input yields a tree that tiles the buffer.

use sprig::testing::{grammars, sexp};
use sprig::{LexErrorKind, ParseStatus, Parser, TextRange, TextSize};

fn parse(text: &str) -> sprig::SyntaxTree {
    Parser::new(grammars::arithmetic()).parse(text, None)
}

#[test]
fn missing_token_is_inserted_at_eof() {
    let tree = parse("1+");
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    assert!(tree.has_error());
    assert_eq!(tree.text(), "1+");
    assert_eq!(
        sexp(&tree),
        "(expr (expr number) plus (expr (MISSING number)))"
    );
    // The inserted token is zero-width at the end of the buffer.
    assert_eq!(tree.error_ranges(), vec![TextRange::empty(TextSize::from(2))]);
}

#[test]
fn stray_token_is_skipped_into_an_error_node() {
    let tree = parse("1+*3");
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    assert_eq!(tree.text(), "1+*3");
    assert_eq!(
        sexp(&tree),
        "(expr (expr number) plus (ERROR star) (expr number))"
    );
    assert_eq!(
        tree.error_ranges(),
        vec![TextRange::new(TextSize::from(2), TextSize::from(3))]
    );
}

#[test]
fn unlexable_bytes_become_error_leaves() {
    let tree = parse("1$2");
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    assert_eq!(tree.text(), "1$2");
    assert_eq!(
        tree.error_ranges(),
        vec![TextRange::new(TextSize::from(1), TextSize::from(3))]
    );

    // The lexical fault is reported alongside the tree.
    let errors = tree.lex_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, LexErrorKind::NoRuleMatches);
    assert_eq!(
        errors[0].span,
        TextRange::new(TextSize::from(1), TextSize::from(2))
    );
}

#[test]
fn garbage_only_buffer_still_tiles() {
    let tree = parse("???");
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    assert_eq!(tree.text(), "???");
    assert_eq!(tree.text_len(), TextSize::from(3));
    // The root keeps the start symbol even when nothing parsed.
    assert_eq!(
        tree.language().symbol_name(tree.root().symbol()),
        "expr"
    );
}

#[test]
fn unclosed_paren_recovers_totally() {
    for text in ["(1+2", "((1", ")", "1+2)"] {
        let tree = parse(text);
        assert_eq!(tree.status(), ParseStatus::ErrorsPresent, "{text:?}");
        assert_eq!(tree.text(), text, "{text:?}");
    }
}

#[test]
fn trailing_trivia_survives_recovery() {
    let tree = parse("1+ # half-finished\n");
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    assert_eq!(tree.text(), "1+ # half-finished\n");
    assert_eq!(
        sexp(&tree),
        "(expr (expr number) plus (expr (MISSING number)))"
    );
}

#[test]
fn recovery_preserves_every_valid_prefix_token() {
    // "1+2*" keeps the fully parsed "1+2" shape and only the dangling
    // operator needs repair.
    let tree = parse("1+2*");
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    assert_eq!(tree.text(), "1+2*");
    assert_eq!(
        sexp(&tree),
        "(expr (expr number) plus (expr (expr number) star (expr (MISSING number))))"
    );
}

#[test]
fn error_ranges_come_out_in_source_order() {
    let tree = parse("1+*2+*3");
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
    assert_eq!(tree.text(), "1+*2+*3");
    let ranges = tree.error_ranges();
    assert!(!ranges.is_empty());
    for pair in ranges.windows(2) {
        assert!(pair[0].start() <= pair[1].start());
    }
}
