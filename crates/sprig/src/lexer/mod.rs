//! # Token scanner
//!
//! Converts source bytes into classified tokens on demand. Recognition runs
//! in two stages per token: the language's external scanner gets the first
//! chance whenever the current parse state declares external tokens, then the
//! static byte-level automaton runs longest-match with earliest-rule
//! tie-breaking. The parse state also filters static matches: the longest
//! accept whose symbol the state can act on beats a longer one it cannot,
//! with the raw longest match as the fallback.
//!
//! The scanner records how far past each token's end it had to look. That
//! lookahead distance is what lets incremental reparsing decide whether an
//! edit can affect a token produced earlier in the buffer.

use crate::error::{LexError, LexErrorKind};
use crate::language::{Language, ParseState, SymbolId};
use crate::syntax::{TextRange, TextSize};

/// Byte cursor handed to external scanners.
///
/// Every byte examined through [`peek`](Self::peek) is counted as lookahead,
/// including a probe past the end of the buffer. Consuming bytes without
/// calling [`mark_end`](Self::mark_end) produces an empty token.
pub struct ScanCursor<'a> {
    text: &'a [u8],
    start: usize,
    pos: usize,
    marked: usize,
    /// One past the furthest byte index examined.
    probed: usize,
}

impl<'a> ScanCursor<'a> {
    pub(crate) fn new(text: &'a str, start: usize) -> Self {
        Self {
            text: text.as_bytes(),
            start,
            pos: start,
            marked: start,
            probed: start,
        }
    }

    /// The byte at the cursor, without consuming it. `None` at end of input;
    /// the probe is recorded either way.
    pub fn peek(&mut self) -> Option<u8> {
        self.probed = self.probed.max(self.pos + 1);
        self.text.get(self.pos).copied()
    }

    /// Consume one byte. No-op at end of input.
    pub fn advance(&mut self) {
        self.probed = self.probed.max(self.pos + 1);
        if self.pos < self.text.len() {
            self.pos += 1;
        }
    }

    /// Record the current position as the end of the token being scanned.
    pub fn mark_end(&mut self) {
        self.marked = self.pos;
    }

    /// Offset where this scan attempt began.
    #[must_use]
    pub fn start(&self) -> TextSize {
        TextSize::from(u32::try_from(self.start).unwrap_or(u32::MAX))
    }

    /// Current offset.
    #[must_use]
    pub fn position(&self) -> TextSize {
        TextSize::from(u32::try_from(self.pos).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub(crate) fn marked(&self) -> usize {
        self.marked
    }

    pub(crate) fn probed(&self) -> usize {
        self.probed
    }
}

/// One recognized token, before it becomes a green leaf.
#[derive(Debug, Clone)]
pub(crate) struct Lexeme {
    pub symbol: SymbolId,
    pub range: TextRange,
    /// Bytes examined past `range.end()` to recognize this token.
    pub lookahead: u32,
    pub is_trivia: bool,
    /// No rule matched; the token is a synthetic one-byte error leaf.
    pub invalid: bool,
    /// External-scanner state at the token's start, when the language has an
    /// external scanner.
    pub ext_before: Option<Box<[u8]>>,
    /// External-scanner state after the token was consumed.
    pub ext_after: Option<Box<[u8]>>,
}

impl Lexeme {
    pub(crate) fn is_end(&self) -> bool {
        self.symbol == SymbolId::END
    }
}

/// Pull-based tokenizer over one buffer.
pub(crate) struct Scanner<'a> {
    language: &'a Language,
    text: &'a str,
    pos: usize,
    external: Option<Box<dyn crate::language::ExternalScanner>>,
    errors: Vec<LexError>,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(language: &'a Language, text: &'a str) -> Self {
        let external = language.create_external_scanner();
        Self {
            language,
            text,
            pos: 0,
            external,
            errors: Vec::new(),
        }
    }

    pub(crate) fn position(&self) -> TextSize {
        TextSize::from(u32::try_from(self.pos).unwrap_or(u32::MAX))
    }

    /// Jump to `offset`, restoring the external scanner to the state it had
    /// there. Used when resuming after a reused subtree.
    pub(crate) fn seek(&mut self, offset: TextSize, external_state: Option<&[u8]>) {
        self.pos = offset.as_usize();
        if let (Some(scanner), Some(bytes)) = (self.external.as_mut(), external_state) {
            scanner.deserialize(bytes);
        }
    }

    pub(crate) fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Serialized external-scanner state at the current position.
    pub(crate) fn external_state(&self) -> Option<Box<[u8]>> {
        self.external
            .as_ref()
            .map(|scanner| scanner.serialize().into_boxed_slice())
    }

    /// Scan the next token under the given parse state.
    ///
    /// Trivia and invalid tokens come out like any other; the caller decides
    /// where they attach. At end of input this yields the zero-length end
    /// token.
    pub(crate) fn next(&mut self, state: &ParseState) -> Lexeme {
        let ext_before = self.external_state();

        let externals = state.external_tokens();
        if !externals.is_empty() {
            if let Some(scanner) = self.external.as_mut() {
                let mut cursor = ScanCursor::new(self.text, self.pos);
                if let Some(symbol) = scanner.scan(&mut cursor, externals) {
                    let start = self.pos;
                    let end = cursor.marked();
                    let lookahead = cursor.probed().saturating_sub(end);
                    self.pos = end;
                    return Lexeme {
                        symbol,
                        range: range_of(start, end),
                        lookahead: u32::try_from(lookahead).unwrap_or(u32::MAX),
                        is_trivia: self.language.is_trivia(symbol),
                        invalid: false,
                        ext_before,
                        ext_after: self.external_state(),
                    };
                }
            }
        }

        if self.pos >= self.text.len() {
            return Lexeme {
                symbol: SymbolId::END,
                range: TextRange::at(self.position(), TextSize::zero()),
                // Recognizing end of input examines the byte that is not
                // there; an append at this offset must invalidate upstream.
                lookahead: 1,
                is_trivia: false,
                invalid: false,
                ext_before,
                ext_after: self.external_state(),
            };
        }

        let lex = self.language.lex_table();
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut cur = start;
        let mut probed = start;
        let mut lex_state = 0u32;
        let mut last_accept: Option<(SymbolId, usize)> = None;
        let mut last_usable: Option<(SymbolId, usize)> = None;

        loop {
            if let Some(accept) = lex.state(lex_state).accept() {
                last_accept = Some((accept.symbol, cur));
                // A match the current parse state cannot act on loses to a
                // shorter one it can; trivia is usable everywhere.
                if self.language.is_trivia(accept.symbol) || state.has_action(accept.symbol) {
                    last_usable = Some((accept.symbol, cur));
                }
            }
            probed = probed.max(cur + 1);
            let Some(&byte) = bytes.get(cur) else {
                break;
            };
            let Some(next) = lex.state(lex_state).step(byte) else {
                break;
            };
            lex_state = next;
            cur += 1;
        }

        match last_usable.or(last_accept) {
            Some((symbol, end)) if end > start => {
                self.pos = end;
                Lexeme {
                    symbol,
                    range: range_of(start, end),
                    lookahead: u32::try_from(probed.saturating_sub(end)).unwrap_or(u32::MAX),
                    is_trivia: self.language.is_trivia(symbol),
                    invalid: false,
                    ext_before,
                    ext_after: self.external_state(),
                }
            }
            _ => {
                // Skip a whole UTF-8 scalar so token texts stay valid string
                // slices.
                let width = utf8_width(bytes[start]);
                let end = (start + width).min(bytes.len());
                self.pos = end;
                let range = range_of(start, end);
                self.errors.push(LexError {
                    span: range,
                    kind: LexErrorKind::NoRuleMatches,
                });
                Lexeme {
                    symbol: SymbolId::ERROR,
                    range,
                    lookahead: u32::try_from(probed.saturating_sub(end)).unwrap_or(0),
                    is_trivia: false,
                    invalid: true,
                    ext_before,
                    ext_after: self.external_state(),
                }
            }
        }
    }

    pub(crate) fn text_of(&self, range: TextRange) -> &'a str {
        &self.text[range.start().as_usize()..range.end().as_usize()]
    }
}

fn range_of(start: usize, end: usize) -> TextRange {
    TextRange::new(
        TextSize::from(u32::try_from(start).unwrap_or(u32::MAX)),
        TextSize::from(u32::try_from(end).unwrap_or(u32::MAX)),
    )
}

const fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{
        LexAccept, LexState, LexTable, ParseTable, Production, ParseAction, SymbolInfo, SymbolKind,
    };
    use crate::language::{Language, StateId, SymbolId};

    // end=0, number=1, plus=2, space=3 (trivia), expr=4
    fn digits_language() -> Language {
        let symbols = vec![
            SymbolInfo::new("end", SymbolKind::Terminal),
            SymbolInfo::new("number", SymbolKind::Terminal),
            SymbolInfo::new("plus", SymbolKind::Terminal),
            SymbolInfo::new("space", SymbolKind::Trivia),
            SymbolInfo::new("expr", SymbolKind::NonTerminal),
        ];

        let mut lex = LexTable::new();
        let mut start = LexState::new();
        start.add_transition(b'0', b'9', 1);
        start.add_transition(b'+', b'+', 2);
        start.add_transition(b' ', b' ', 3);
        start.finish();
        lex.push_state(start);

        let mut digits = LexState::new();
        digits.add_transition(b'0', b'9', 1);
        digits.set_accept(LexAccept::new(SymbolId(1), 0));
        digits.finish();
        lex.push_state(digits);

        let mut plus = LexState::new();
        plus.set_accept(LexAccept::new(SymbolId(2), 1));
        plus.finish();
        lex.push_state(plus);

        let mut space = LexState::new();
        space.add_transition(b' ', b' ', 3);
        space.set_accept(LexAccept::new(SymbolId(3), 2));
        space.finish();
        lex.push_state(space);

        let mut parse = ParseTable::new(SymbolId(4));
        let production = parse.push_production(Production::new(SymbolId(4), 0));
        let mut state = ParseState::new();
        state.add_action(SymbolId::END, ParseAction::Reduce(production));
        state.add_goto(SymbolId(4), StateId(1));
        parse.push_state(state);
        let mut accept = ParseState::new();
        accept.add_action(SymbolId::END, ParseAction::Accept);
        parse.push_state(accept);

        Language::new(symbols, lex, parse).expect("valid test language")
    }

    fn scan_all(language: &Language, text: &str) -> Vec<Lexeme> {
        let mut scanner = Scanner::new(language, text);
        let state = language.parse_table().state(StateId::START);
        let mut out = Vec::new();
        loop {
            let lexeme = scanner.next(state);
            let done = lexeme.is_end();
            out.push(lexeme);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn longest_match_wins() {
        let language = digits_language();
        let tokens = scan_all(&language, "123+4");
        let spans: Vec<(u16, u32, u32)> = tokens
            .iter()
            .map(|t| (t.symbol.0, t.range.start().into(), t.range.end().into()))
            .collect();
        assert_eq!(
            spans,
            vec![(1, 0, 3), (2, 3, 4), (1, 4, 5), (0, 5, 5)],
        );
    }

    #[test]
    fn trivia_is_flagged() {
        let language = digits_language();
        let tokens = scan_all(&language, "1 2");
        assert!(!tokens[0].is_trivia);
        assert!(tokens[1].is_trivia);
        assert_eq!(tokens[1].range, TextRange::new(1.into(), 2.into()));
        assert!(!tokens[2].is_trivia);
    }

    #[test]
    fn number_lookahead_covers_the_probe() {
        let language = digits_language();
        let tokens = scan_all(&language, "12+3");
        // Scanning "12" examined the '+' to stop the number.
        assert_eq!(tokens[0].lookahead, 1);
        // Scanning the final "3" probed past end of input.
        assert_eq!(tokens[2].lookahead, 1);
    }

    #[test]
    fn unknown_byte_becomes_invalid_token() {
        let language = digits_language();
        let mut scanner = Scanner::new(&language, "1#2");
        let state = language.parse_table().state(StateId::START);

        let first = scanner.next(state);
        assert_eq!(first.symbol, SymbolId(1));

        let bad = scanner.next(state);
        assert!(bad.invalid);
        assert_eq!(bad.symbol, SymbolId::ERROR);
        assert_eq!(bad.range, TextRange::new(1.into(), 2.into()));

        let after = scanner.next(state);
        assert_eq!(after.symbol, SymbolId(1));

        let errors = scanner.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::NoRuleMatches);
    }

    #[test]
    fn multibyte_garbage_stays_one_scalar() {
        let language = digits_language();
        let mut scanner = Scanner::new(&language, "é1");
        let state = language.parse_table().state(StateId::START);
        let bad = scanner.next(state);
        assert!(bad.invalid);
        assert_eq!(bad.range.len(), TextSize::from(2));
        assert_eq!(scanner.text_of(bad.range), "é");
    }

    #[test]
    fn empty_input_yields_end_immediately() {
        let language = digits_language();
        let tokens = scan_all(&language, "");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_end());
        assert!(tokens[0].range.is_empty());
    }
}
