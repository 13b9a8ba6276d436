//! Ready-made fixture languages.

use crate::language::{Associativity, ExternalScanner, LanguageRef, SymbolId, SymbolSet};
use crate::lexer::ScanCursor;
use crate::testing::lex::Pattern;
use crate::testing::slr::GrammarBuilder;
use std::sync::Arc;

fn whitespace() -> Pattern {
    Pattern::repeat(Pattern::class(&[(b' ', b' '), (b'\t', b'\t'), (b'\n', b'\n')]))
}

/// Infix arithmetic with precedence: `*` binds tighter than `+`, both left
/// associative. Whitespace and `#` line comments are trivia.
#[must_use]
pub fn arithmetic() -> LanguageRef {
    let mut g = GrammarBuilder::new();
    let _ws = g.trivia("ws", whitespace());
    let _comment = g.trivia(
        "comment",
        Pattern::seq([
            Pattern::literal("#"),
            Pattern::star(Pattern::class(&[(0x01, b'\n' - 1), (b'\n' + 1, 0x7f)])),
        ]),
    );
    let number = g.terminal("number", Pattern::repeat(Pattern::class(&[(b'0', b'9')])));
    let plus = g.terminal_with_prec("plus", Pattern::literal("+"), 1, Associativity::Left);
    let star = g.terminal_with_prec("star", Pattern::literal("*"), 2, Associativity::Left);
    let lparen = g.terminal("lparen", Pattern::literal("("));
    let rparen = g.terminal("rparen", Pattern::literal(")"));
    let expr = g.nonterminal("expr");
    g.start(expr);
    g.rule(expr, &[expr, plus, expr]);
    g.rule(expr, &[expr, star, expr]);
    g.rule(expr, &[lparen, expr, rparen]);
    g.rule(expr, &[number]);
    Arc::new(g.build().expect("fixture grammar is valid"))
}

/// The same sum grammar with no precedence declared, so every `+` is a
/// declared conflict and the automaton forks.
#[must_use]
pub fn ambiguous_sums() -> LanguageRef {
    let mut g = GrammarBuilder::new();
    let _ws = g.trivia("ws", whitespace());
    let number = g.terminal("number", Pattern::repeat(Pattern::class(&[(b'0', b'9')])));
    let plus = g.terminal("plus", Pattern::literal("+"));
    let expr = g.nonterminal("expr");
    g.start(expr);
    g.rule(expr, &[expr, plus, expr]);
    g.rule(expr, &[number]);
    Arc::new(g.build().expect("fixture grammar is valid"))
}

/// Words plus `{…}` blobs with balanced nesting, where the blob token comes
/// from an external scanner that round-trips its state at token boundaries.
#[must_use]
pub fn words_and_blobs() -> LanguageRef {
    let mut g = GrammarBuilder::new();
    let _ws = g.trivia("ws", whitespace());
    let word = g.terminal("word", Pattern::repeat(Pattern::class(&[(b'a', b'z')])));
    let blob = g.external("blob");
    let item = g.nonterminal("item");
    let doc = g.nonterminal("doc");
    g.start(doc);
    g.rule(doc, &[item]);
    g.rule(doc, &[doc, item]);
    g.rule(item, &[word]);
    g.rule(item, &[blob]);

    let language = g
        .build_with_scanner(Arc::new(move || {
            Box::new(BlobScanner {
                blob,
                scanned: 0,
            }) as Box<dyn ExternalScanner>
        }))
        .expect("fixture grammar is valid");
    Arc::new(language)
}

/// Matches `{ … }` with nested braces as one token. Counts tokens scanned so
/// the serialize/restore path carries real state.
struct BlobScanner {
    blob: SymbolId,
    scanned: u32,
}

impl ExternalScanner for BlobScanner {
    fn scan(&mut self, cursor: &mut ScanCursor<'_>, valid: &SymbolSet) -> Option<SymbolId> {
        if !valid.contains(self.blob) {
            return None;
        }
        if cursor.peek() != Some(b'{') {
            return None;
        }
        cursor.advance();
        let mut depth = 1u32;
        loop {
            match cursor.peek() {
                Some(b'{') => {
                    depth += 1;
                    cursor.advance();
                }
                Some(b'}') => {
                    depth -= 1;
                    cursor.advance();
                    if depth == 0 {
                        cursor.mark_end();
                        self.scanned += 1;
                        return Some(self.blob);
                    }
                }
                Some(_) => cursor.advance(),
                // Unterminated blob: decline and let the static automaton
                // report the brace as invalid.
                None => return None,
            }
        }
    }

    fn serialize(&self) -> Vec<u8> {
        self.scanned.to_le_bytes().to_vec()
    }

    fn deserialize(&mut self, bytes: &[u8]) {
        self.scanned = bytes
            .try_into()
            .map(u32::from_le_bytes)
            .unwrap_or_default();
    }
}
