//! Compiles token patterns into a [`LexTable`].
//!
//! The engine only consumes lex tables; this small pattern language plus
//! Thompson construction and subset construction is how the fixtures in this
//! module author them. Patterns are byte-oriented: multi-byte characters are
//! spelled out as their UTF-8 byte sequences.

use crate::language::{LexAccept, LexState, LexTable, SymbolId};
use hashbrown::HashMap;

/// A token pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact byte sequence.
    Literal(String),
    /// One byte from any of the inclusive ranges.
    Class(Vec<(u8, u8)>),
    Seq(Vec<Pattern>),
    Alt(Vec<Pattern>),
    /// One or more.
    Repeat(Box<Pattern>),
    /// Zero or more.
    Star(Box<Pattern>),
    Optional(Box<Pattern>),
}

impl Pattern {
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    #[must_use]
    pub fn class(ranges: &[(u8, u8)]) -> Self {
        Self::Class(ranges.to_vec())
    }

    #[must_use]
    pub fn seq(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::Seq(parts.into_iter().collect())
    }

    #[must_use]
    pub fn alt(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::Alt(parts.into_iter().collect())
    }

    #[must_use]
    pub fn repeat(inner: Self) -> Self {
        Self::Repeat(Box::new(inner))
    }

    #[must_use]
    pub fn star(inner: Self) -> Self {
        Self::Star(Box::new(inner))
    }

    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }
}

#[derive(Default)]
struct NfaState {
    eps: Vec<usize>,
    ranges: Vec<(u8, u8, usize)>,
    accept: Option<(u16, SymbolId)>,
}

#[derive(Default)]
struct Nfa {
    states: Vec<NfaState>,
}

impl Nfa {
    fn push(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    /// Thompson fragment with a single entry and a single exit.
    fn fragment(&mut self, pattern: &Pattern) -> (usize, usize) {
        match pattern {
            Pattern::Literal(text) => {
                let start = self.push();
                let mut cur = start;
                for &byte in text.as_bytes() {
                    let next = self.push();
                    self.states[cur].ranges.push((byte, byte, next));
                    cur = next;
                }
                (start, cur)
            }
            Pattern::Class(ranges) => {
                let start = self.push();
                let end = self.push();
                for &(lo, hi) in ranges {
                    self.states[start].ranges.push((lo, hi, end));
                }
                (start, end)
            }
            Pattern::Seq(parts) => {
                let start = self.push();
                let mut cur = start;
                for part in parts {
                    let (s, e) = self.fragment(part);
                    self.states[cur].eps.push(s);
                    cur = e;
                }
                (start, cur)
            }
            Pattern::Alt(parts) => {
                let start = self.push();
                let end = self.push();
                for part in parts {
                    let (s, e) = self.fragment(part);
                    self.states[start].eps.push(s);
                    self.states[e].eps.push(end);
                }
                (start, end)
            }
            Pattern::Repeat(inner) => {
                let (s, e) = self.fragment(inner);
                let end = self.push();
                self.states[e].eps.push(end);
                self.states[e].eps.push(s);
                (s, end)
            }
            Pattern::Star(inner) => {
                let start = self.push();
                let end = self.push();
                let (s, e) = self.fragment(inner);
                self.states[start].eps.push(s);
                self.states[start].eps.push(end);
                self.states[e].eps.push(end);
                self.states[e].eps.push(s);
                (start, end)
            }
            Pattern::Optional(inner) => {
                let start = self.push();
                let end = self.push();
                let (s, e) = self.fragment(inner);
                self.states[start].eps.push(s);
                self.states[start].eps.push(end);
                self.states[e].eps.push(end);
                (start, end)
            }
        }
    }

    fn closure(&self, seed: &[usize]) -> Vec<usize> {
        let mut out: Vec<usize> = seed.to_vec();
        let mut stack: Vec<usize> = seed.to_vec();
        while let Some(state) = stack.pop() {
            for &next in &self.states[state].eps {
                if !out.contains(&next) {
                    out.push(next);
                    stack.push(next);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Compile patterns into a deterministic lex table. Declaration order is the
/// rule order used for tie-breaking equal-length matches.
#[must_use]
pub fn build_lex_table(patterns: &[(SymbolId, Pattern)]) -> LexTable {
    let mut nfa = Nfa::default();
    let start = nfa.push();
    for (rule, (symbol, pattern)) in patterns.iter().enumerate() {
        let (s, e) = nfa.fragment(pattern);
        nfa.states[start].eps.push(s);
        nfa.states[e].accept = Some((u16::try_from(rule).unwrap_or(u16::MAX), *symbol));
    }

    let mut ids: HashMap<Vec<usize>, u32, ahash::RandomState> = HashMap::default();
    let mut sets: Vec<Vec<usize>> = Vec::new();
    let mut states: Vec<LexState> = Vec::new();

    let initial = nfa.closure(&[start]);
    ids.insert(initial.clone(), 0);
    sets.push(initial);

    let mut next = 0usize;
    while next < sets.len() {
        let members = sets[next].clone();
        let mut state = LexState::new();

        if let Some((rule, symbol)) = members
            .iter()
            .filter_map(|&m| nfa.states[m].accept)
            .min_by_key(|&(rule, _)| rule)
        {
            state.set_accept(LexAccept::new(symbol, rule));
        }

        // Split the byte space at every range boundary so each resulting
        // interval has one constant target set.
        let mut cuts: Vec<u16> = Vec::new();
        for &m in &members {
            for &(lo, hi, _) in &nfa.states[m].ranges {
                cuts.push(u16::from(lo));
                cuts.push(u16::from(hi) + 1);
            }
        }
        cuts.sort_unstable();
        cuts.dedup();

        for window in cuts.windows(2) {
            let (a, b) = (window[0], window[1]);
            if a > u16::from(u8::MAX) {
                break;
            }
            let probe = u8::try_from(a).unwrap_or(u8::MAX);
            let mut targets: Vec<usize> = Vec::new();
            for &m in &members {
                for &(lo, hi, target) in &nfa.states[m].ranges {
                    if lo <= probe && probe <= hi {
                        targets.push(target);
                    }
                }
            }
            if targets.is_empty() {
                continue;
            }
            let closed = nfa.closure(&targets);
            let id = match ids.get(&closed) {
                Some(&id) => id,
                None => {
                    let id = u32::try_from(sets.len()).unwrap_or(u32::MAX);
                    ids.insert(closed.clone(), id);
                    sets.push(closed);
                    id
                }
            };
            let hi = u8::try_from(b - 1).unwrap_or(u8::MAX);
            state.add_transition(probe, hi, id);
        }

        state.finish();
        states.push(state);
        next += 1;
    }

    let mut table = LexTable::new();
    for state in states {
        table.push_state(state);
    }
    table
}
