//! The static token automaton, supplied as data alongside the parse table.
//!
//! States transition on byte ranges so the automaton works uniformly over
//! UTF-8 without decoding; multi-byte characters are matched byte by byte.

use crate::language::SymbolId;

/// Accepting information for a lex state.
///
/// `rule` is the declaration index of the token rule; when two rules accept a
/// match of equal length the lower rule index wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LexAccept {
    pub symbol: SymbolId,
    pub rule: u16,
}

impl LexAccept {
    #[must_use]
    pub const fn new(symbol: SymbolId, rule: u16) -> Self {
        Self { symbol, rule }
    }
}

/// One state of the token automaton.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LexState {
    /// `(lo, hi, target)` inclusive byte ranges, sorted by `lo`, non-overlapping.
    transitions: Vec<(u8, u8, u32)>,
    accept: Option<LexAccept>,
}

impl LexState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transition(&mut self, lo: u8, hi: u8, target: u32) {
        self.transitions.push((lo, hi, target));
    }

    pub fn set_accept(&mut self, accept: LexAccept) {
        // Keep the earliest-declared rule on merged DFA states.
        match self.accept {
            Some(existing) if existing.rule <= accept.rule => {}
            _ => self.accept = Some(accept),
        }
    }

    /// Sort transitions so lookup can binary-search.
    pub fn finish(&mut self) {
        self.transitions.sort_by_key(|(lo, _, _)| *lo);
    }

    #[must_use]
    pub fn step(&self, byte: u8) -> Option<u32> {
        self.transitions
            .binary_search_by(|(lo, hi, _)| {
                if byte < *lo {
                    std::cmp::Ordering::Greater
                } else if byte > *hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
            .map(|idx| self.transitions[idx].2)
    }

    #[must_use]
    pub const fn accept(&self) -> Option<LexAccept> {
        self.accept
    }

    pub(crate) fn transitions(&self) -> &[(u8, u8, u32)] {
        &self.transitions
    }
}

/// Compiled token automaton. State 0 is the start state.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LexTable {
    states: Vec<LexState>,
}

impl LexTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_state(&mut self, state: LexState) -> u32 {
        let id = u32::try_from(self.states.len()).unwrap_or(u32::MAX);
        self.states.push(state);
        id
    }

    #[must_use]
    pub fn state(&self, id: u32) -> &LexState {
        &self.states[id as usize]
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn states(&self) -> &[LexState] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_uses_byte_ranges() {
        let mut state = LexState::new();
        state.add_transition(b'a', b'z', 1);
        state.add_transition(b'0', b'9', 2);
        state.finish();

        assert_eq!(state.step(b'q'), Some(1));
        assert_eq!(state.step(b'5'), Some(2));
        assert_eq!(state.step(b'!'), None);
    }

    #[test]
    fn accept_prefers_earlier_rule() {
        let mut state = LexState::new();
        state.set_accept(LexAccept {
            symbol: SymbolId(7),
            rule: 3,
        });
        state.set_accept(LexAccept {
            symbol: SymbolId(2),
            rule: 1,
        });
        state.set_accept(LexAccept {
            symbol: SymbolId(9),
            rule: 5,
        });

        assert_eq!(state.accept().map(|a| a.symbol), Some(SymbolId(2)));
    }
}
