//! The externally supplied parse tables.
//!
//! A [`ParseTable`] is compiled ahead of time by grammar tooling and handed to
//! the engine as immutable data. The engine never authors tables; it only
//! validates and consumes them.

use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Identifier of a terminal or non-terminal symbol in the grammar.
///
/// Symbol 0 is reserved for the end-of-input terminal. The error symbol is a
/// sentinel outside the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolId(pub u16);

impl SymbolId {
    /// End-of-input terminal, present in every symbol table.
    pub const END: Self = Self(0);
    /// Synthetic error symbol; not part of the supplied symbol table.
    pub const ERROR: Self = Self(u16::MAX);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        self.0 == u16::MAX
    }
}

/// Automaton state identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct StateId(pub u32);

impl StateId {
    pub const START: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the production table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ProductionId(pub u16);

impl ProductionId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Role of a symbol in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolKind {
    /// Produced by the static token automaton.
    Terminal,
    /// Produced by reductions.
    NonTerminal,
    /// Terminal that never reaches the automaton as lookahead; attached to
    /// the tree next to the nearest following token.
    Trivia,
    /// Terminal produced only by the language's external scanner.
    External,
}

/// Name and role of one grammar symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolInfo {
    pub name: CompactString,
    pub kind: SymbolKind,
}

impl SymbolInfo {
    #[must_use]
    pub fn new(name: impl Into<CompactString>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Operator associativity used when resolving declared conflicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Associativity {
    Left,
    Right,
    #[default]
    NonAssoc,
}

/// One production of the grammar.
///
/// Only the left-hand symbol and the right-hand-side length are needed at
/// parse time; the RHS symbols themselves are implicit in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Production {
    pub lhs: SymbolId,
    pub len: u8,
    pub precedence: i16,
    pub associativity: Associativity,
}

impl Production {
    #[must_use]
    pub const fn new(lhs: SymbolId, len: u8) -> Self {
        Self {
            lhs,
            len,
            precedence: 0,
            associativity: Associativity::NonAssoc,
        }
    }

    #[must_use]
    pub const fn with_precedence(mut self, precedence: i16, associativity: Associativity) -> Self {
        self.precedence = precedence;
        self.associativity = associativity;
        self
    }
}

/// Parser action for a `(state, lookahead)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseAction {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

/// Actions for one lookahead; more than one entry is a declared conflict and
/// triggers bounded forking.
pub type ActionList = SmallVec<[ParseAction; 2]>;

/// A compact membership set over symbol ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolSet {
    words: SmallVec<[u64; 4]>,
}

impl SymbolSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: SymbolId) {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    #[must_use]
    pub fn contains(&self, symbol: SymbolId) -> bool {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, word)| {
            (0..64)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| SymbolId(u16::try_from(wi * 64 + bit).unwrap_or(u16::MAX)))
        })
    }
}

impl FromIterator<SymbolId> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = SymbolId>>(iter: I) -> Self {
        let mut set = Self::new();
        for symbol in iter {
            set.insert(symbol);
        }
        set
    }
}

/// One state of the parse automaton.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    actions: HashMap<SymbolId, ActionList, ahash::RandomState>,
    gotos: HashMap<SymbolId, StateId, ahash::RandomState>,
    /// External tokens that are valid lookahead in this state.
    external_tokens: SymbolSet,
}

impl ParseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action; repeated calls for one lookahead declare a conflict.
    pub fn add_action(&mut self, lookahead: SymbolId, action: ParseAction) {
        self.actions.entry(lookahead).or_default().push(action);
    }

    pub fn add_goto(&mut self, nonterminal: SymbolId, target: StateId) {
        self.gotos.insert(nonterminal, target);
    }

    pub fn add_external_token(&mut self, symbol: SymbolId) {
        self.external_tokens.insert(symbol);
    }

    /// Actions for a lookahead terminal. Empty slice means the explicit
    /// error action.
    #[must_use]
    pub fn actions(&self, lookahead: SymbolId) -> &[ParseAction] {
        self.actions.get(&lookahead).map_or(&[], |list| list)
    }

    #[must_use]
    pub fn has_action(&self, lookahead: SymbolId) -> bool {
        self.actions.contains_key(&lookahead)
    }

    #[must_use]
    pub fn goto(&self, nonterminal: SymbolId) -> Option<StateId> {
        self.gotos.get(&nonterminal).copied()
    }

    #[must_use]
    pub const fn external_tokens(&self) -> &SymbolSet {
        &self.external_tokens
    }

    pub(crate) fn action_entries(
        &self,
    ) -> impl Iterator<Item = (SymbolId, &[ParseAction])> + '_ {
        self.actions.iter().map(|(sym, list)| (*sym, list.as_slice()))
    }

    pub(crate) fn goto_entries(&self) -> impl Iterator<Item = (SymbolId, StateId)> + '_ {
        self.gotos.iter().map(|(sym, target)| (*sym, *target))
    }

    /// Terminals with a defined action, for recovery candidate checks.
    pub fn lookaheads(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.actions.keys().copied()
    }
}

/// The complete, immutable parse automaton for one language.
#[derive(Debug, Clone)]
pub struct ParseTable {
    states: Vec<ParseState>,
    productions: Vec<Production>,
    start_symbol: SymbolId,
}

impl ParseTable {
    /// State 0 is always the start state.
    #[must_use]
    pub fn new(start_symbol: SymbolId) -> Self {
        Self {
            states: Vec::new(),
            productions: Vec::new(),
            start_symbol,
        }
    }

    pub fn push_state(&mut self, state: ParseState) -> StateId {
        let id = StateId(u32::try_from(self.states.len()).unwrap_or(u32::MAX));
        self.states.push(state);
        id
    }

    pub fn push_production(&mut self, production: Production) -> ProductionId {
        let id = ProductionId(u16::try_from(self.productions.len()).unwrap_or(u16::MAX));
        self.productions.push(production);
        id
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &ParseState {
        &self.states[id.index()]
    }

    #[must_use]
    pub fn try_state(&self, id: StateId) -> Option<&ParseState> {
        self.states.get(id.index())
    }

    #[must_use]
    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.index()]
    }

    #[must_use]
    pub fn try_production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(id.index())
    }

    #[must_use]
    pub const fn start_symbol(&self) -> SymbolId {
        self.start_symbol
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    pub(crate) fn states(&self) -> &[ParseState] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_set_membership() {
        let mut set = SymbolSet::new();
        set.insert(SymbolId(3));
        set.insert(SymbolId(70));

        assert!(set.contains(SymbolId(3)));
        assert!(set.contains(SymbolId(70)));
        assert!(!set.contains(SymbolId(4)));
        assert!(!set.contains(SymbolId(500)));

        let collected: Vec<_> = set.iter().collect();
        assert_eq!(collected, vec![SymbolId(3), SymbolId(70)]);
    }

    #[test]
    fn conflicting_actions_accumulate() {
        let mut state = ParseState::new();
        state.add_action(SymbolId(1), ParseAction::Shift(StateId(4)));
        state.add_action(SymbolId(1), ParseAction::Reduce(ProductionId(0)));

        assert_eq!(state.actions(SymbolId(1)).len(), 2);
        assert!(state.actions(SymbolId(2)).is_empty());
    }

    #[test]
    fn table_indexing_round_trips() {
        let mut table = ParseTable::new(SymbolId(10));
        let prod = table.push_production(Production::new(SymbolId(10), 3));
        let state = table.push_state(ParseState::new());

        assert_eq!(prod, ProductionId(0));
        assert_eq!(state, StateId(0));
        assert_eq!(table.production(prod).len, 3);
        assert_eq!(table.start_symbol(), SymbolId(10));
    }
}
