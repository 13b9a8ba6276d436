//! From-scratch parsing against the arithmetic fixture.

use sprig::testing::{grammars, sexp};
use sprig::{ParseStatus, Parser, TextRange, TextSize};

fn parse(text: &str) -> sprig::SyntaxTree {
    Parser::new(grammars::arithmetic()).parse(text, None)
}

#[test]
fn precedence_shapes_the_tree() {
    let tree = parse("1+2*3");
    assert_eq!(tree.status(), ParseStatus::Ok);
    assert_eq!(
        sexp(&tree),
        "(expr (expr number) plus (expr (expr number) star (expr number)))"
    );
}

#[test]
fn addition_is_left_associative() {
    let tree = parse("1+2+3");
    assert_eq!(
        sexp(&tree),
        "(expr (expr (expr number) plus (expr number)) plus (expr number))"
    );
}

#[test]
fn parentheses_override_precedence() {
    let tree = parse("(1+2)*3");
    assert_eq!(tree.status(), ParseStatus::Ok);
    assert_eq!(
        sexp(&tree),
        "(expr (expr lparen (expr (expr number) plus (expr number)) rparen) star (expr number))"
    );
}

#[test]
fn ranges_tile_the_buffer() {
    let tree = parse("1+2*3");
    let root = tree.root();
    assert_eq!(root.range(), TextRange::new(0.into(), 5.into()));

    let children: Vec<TextRange> = root.children().map(|c| c.range()).collect();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], TextRange::new(0.into(), 1.into()));
    assert_eq!(children[1], TextRange::new(1.into(), 2.into()));
    assert_eq!(children[2], TextRange::new(2.into(), 5.into()));

    // Adjacent children touch exactly.
    for pair in children.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start());
    }
}

#[test]
fn text_round_trips_with_trivia() {
    for text in ["1 + 2", "  1+2  ", "1+2 # trailing comment", "1 * ( 2 + 3 )"] {
        let tree = parse(text);
        assert_eq!(tree.status(), ParseStatus::Ok, "{text:?}");
        assert_eq!(tree.text(), text);
        assert_eq!(tree.text_len(), TextSize::of(text));
    }
}

#[test]
fn trivia_is_invisible_to_structure() {
    let spaced = parse("1 + 2 * 3");
    let dense = parse("1+2*3");
    assert_eq!(sexp(&spaced), sexp(&dense));
}

#[test]
fn overlapping_token_rules_defer_to_the_parse_state() {
    use sprig::testing::{GrammarBuilder, Pattern};
    use std::sync::Arc;

    // "ab" is the longest raw match, but the grammar only ever wants the
    // one-letter tokens, so the scanner has to settle for "a" then "b".
    let mut g = GrammarBuilder::new();
    let _pair = g.terminal("pair", Pattern::literal("ab"));
    let a = g.terminal("a", Pattern::literal("a"));
    let b = g.terminal("b", Pattern::literal("b"));
    let start = g.nonterminal("start");
    g.start(start);
    g.rule(start, &[a, b]);
    let language = Arc::new(g.build().expect("grammar compiles"));

    let tree = Parser::new(language).parse("ab", None);
    assert_eq!(tree.status(), ParseStatus::Ok);
    assert_eq!(tree.text(), "ab");
    assert_eq!(sexp(&tree), "(start a b)");
}

#[test]
fn empty_buffer_still_yields_a_tiling_tree() {
    let tree = parse("");
    assert_eq!(tree.text_len(), TextSize::zero());
    assert_eq!(tree.text(), "");
    // The grammar has no empty production, so the tree carries an error.
    assert_eq!(tree.status(), ParseStatus::ErrorsPresent);
}

#[test]
fn line_and_column_lookup() {
    let tree = parse("1+2 # note\n*3");
    assert_eq!(tree.status(), ParseStatus::Ok);
    let point = tree.point_at(TextSize::from(11));
    assert_eq!((point.row, point.column), (1, 0));
    assert_eq!(tree.line_index().line_count(), 2);

    // The root's point range spans both lines.
    let span = tree.point_range(tree.root().range());
    assert_eq!(span.start, sprig::Point::new(0, 0));
    assert_eq!(span.end, sprig::Point::new(1, 2));
}

#[test]
fn forked_ambiguity_is_deterministic() {
    let language = grammars::ambiguous_sums();
    let mut parser = Parser::new(language);
    let a = parser.parse("1+2+3", None);
    let b = parser.parse("1+2+3", None);

    assert_eq!(a.status(), ParseStatus::Ok);
    assert_eq!(sexp(&a), sexp(&b));
    assert_eq!(a.green_root(), b.green_root());
    assert_eq!(a.text(), "1+2+3");
}

#[test]
fn disabled_forking_still_parses_conflicts() {
    use sprig::{ForkPolicy, ParseOptions};
    let options = ParseOptions {
        fork: ForkPolicy::disabled(),
        ..ParseOptions::default()
    };
    let mut parser = Parser::with_options(grammars::ambiguous_sums(), options);
    let tree = parser.parse("1+2+3+4", None);
    assert_eq!(tree.status(), ParseStatus::Ok);
    assert_eq!(tree.text(), "1+2+3+4");
}

#[test]
fn timeout_returns_a_partial_tiling_tree() {
    use sprig::{ParseBudget, ParseOptions};
    let options = ParseOptions {
        budget: ParseBudget::unlimited().with_max_steps(4),
        ..ParseOptions::default()
    };
    let text = "1+2*3+4*5+6";
    let mut parser = Parser::with_options(grammars::arithmetic(), options);
    let tree = parser.parse(text, None);

    assert_eq!(tree.status(), ParseStatus::TimedOut);
    assert_eq!(tree.text(), text);
    assert_eq!(tree.text_len(), TextSize::of(text));
}

#[test]
fn cursor_walks_the_parsed_tree() {
    let tree = parse("1+2");
    let mut cursor = tree.cursor();
    assert!(cursor.goto_first_child());

    let mut leaves = Vec::new();
    loop {
        if !cursor.goto_first_child() {
            if let sprig::SyntaxElement::Token(token) = cursor.element() {
                leaves.push(token.text().to_owned());
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    let all: String = leaves.concat();
                    assert_eq!(all, "1+2");
                    return;
                }
            }
        }
    }
}
