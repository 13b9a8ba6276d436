//! SLR(1) table construction for fixture grammars.
//!
//! The engine treats parse tables as opaque input data; this builder is the
//! in-repo stand-in for the grammar tooling that would normally produce
//! them. Shift/reduce conflicts are resolved with declared precedence and
//! associativity where available; anything left unresolved is emitted as a
//! multi-action entry, which the automaton explores by forking.

use crate::error::LanguageError;
use crate::language::{
    Associativity, Language, ParseAction, ParseState, ParseTable, Production, ScannerFactory,
    SymbolId, SymbolInfo, SymbolKind,
};
use crate::testing::lex::{build_lex_table, Pattern};
use hashbrown::HashMap;
use std::collections::BTreeSet;

struct Rule {
    lhs: SymbolId,
    rhs: Vec<SymbolId>,
    precedence: Option<(i16, Associativity)>,
}

/// Builds a [`Language`] from rules and token patterns.
pub struct GrammarBuilder {
    symbols: Vec<SymbolInfo>,
    patterns: Vec<(SymbolId, Pattern)>,
    terminal_prec: HashMap<SymbolId, (i16, Associativity), ahash::RandomState>,
    rules: Vec<Rule>,
    start: Option<SymbolId>,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            symbols: vec![SymbolInfo::new("end", SymbolKind::Terminal)],
            patterns: Vec::new(),
            terminal_prec: HashMap::default(),
            rules: Vec::new(),
            start: None,
        }
    }

    fn push_symbol(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(u16::try_from(self.symbols.len()).unwrap_or(u16::MAX));
        self.symbols.push(SymbolInfo::new(name, kind));
        id
    }

    pub fn terminal(&mut self, name: &str, pattern: Pattern) -> SymbolId {
        let id = self.push_symbol(name, SymbolKind::Terminal);
        self.patterns.push((id, pattern));
        id
    }

    pub fn terminal_with_prec(
        &mut self,
        name: &str,
        pattern: Pattern,
        precedence: i16,
        associativity: Associativity,
    ) -> SymbolId {
        let id = self.terminal(name, pattern);
        self.terminal_prec.insert(id, (precedence, associativity));
        id
    }

    pub fn trivia(&mut self, name: &str, pattern: Pattern) -> SymbolId {
        let id = self.push_symbol(name, SymbolKind::Trivia);
        self.patterns.push((id, pattern));
        id
    }

    /// A terminal recognized only by the language's external scanner.
    pub fn external(&mut self, name: &str) -> SymbolId {
        self.push_symbol(name, SymbolKind::External)
    }

    pub fn nonterminal(&mut self, name: &str) -> SymbolId {
        self.push_symbol(name, SymbolKind::NonTerminal)
    }

    pub fn start(&mut self, symbol: SymbolId) {
        self.start = Some(symbol);
    }

    pub fn rule(&mut self, lhs: SymbolId, rhs: &[SymbolId]) {
        self.rules.push(Rule {
            lhs,
            rhs: rhs.to_vec(),
            precedence: None,
        });
    }

    pub fn rule_with_prec(
        &mut self,
        lhs: SymbolId,
        rhs: &[SymbolId],
        precedence: i16,
        associativity: Associativity,
    ) {
        self.rules.push(Rule {
            lhs,
            rhs: rhs.to_vec(),
            precedence: Some((precedence, associativity)),
        });
    }

    /// # Errors
    ///
    /// Fails with the same [`LanguageError`]s as [`Language::new`], plus
    /// `MissingStartSymbol` when no start symbol was declared.
    pub fn build(self) -> Result<Language, LanguageError> {
        let (symbols, lex, parse) = self.compile()?;
        Language::new(symbols, lex, parse)
    }

    /// # Errors
    ///
    /// Same failures as [`GrammarBuilder::build`].
    pub fn build_with_scanner(self, factory: ScannerFactory) -> Result<Language, LanguageError> {
        let (symbols, lex, parse) = self.compile()?;
        Language::new(symbols, lex, parse).map(|language| language.with_external_scanner(factory))
    }

    fn compile(self) -> Result<(Vec<SymbolInfo>, crate::language::LexTable, ParseTable), LanguageError> {
        let Some(start) = self.start else {
            return Err(LanguageError::MissingStartSymbol(SymbolId::ERROR));
        };

        let lex = build_lex_table(&self.patterns);
        let builder = TableBuilder::new(&self.symbols, &self.rules, start, &self.terminal_prec);
        let parse = builder.build();
        Ok((self.symbols, lex, parse))
    }
}

/// `(rule index, dot position)`; the augmented rule uses index `rules.len()`.
type Item = (usize, usize);

struct TableBuilder<'a> {
    symbols: &'a [SymbolInfo],
    rules: &'a [Rule],
    start: SymbolId,
    aug_rhs: [SymbolId; 1],
    terminal_prec: &'a HashMap<SymbolId, (i16, Associativity), ahash::RandomState>,
    nullable: Vec<bool>,
    first: Vec<BTreeSet<SymbolId>>,
    follow: Vec<BTreeSet<SymbolId>>,
}

impl<'a> TableBuilder<'a> {
    fn new(
        symbols: &'a [SymbolInfo],
        rules: &'a [Rule],
        start: SymbolId,
        terminal_prec: &'a HashMap<SymbolId, (i16, Associativity), ahash::RandomState>,
    ) -> Self {
        let mut builder = Self {
            symbols,
            rules,
            start,
            aug_rhs: [start],
            terminal_prec,
            nullable: vec![false; symbols.len()],
            first: vec![BTreeSet::new(); symbols.len()],
            follow: vec![BTreeSet::new(); symbols.len()],
        };
        builder.compute_first();
        builder.compute_follow();
        builder
    }

    fn is_nonterminal(&self, symbol: SymbolId) -> bool {
        self.symbols
            .get(symbol.index())
            .is_some_and(|info| info.kind == SymbolKind::NonTerminal)
    }

    fn rhs_of(&self, rule: usize) -> &[SymbolId] {
        if rule == self.rules.len() {
            &self.aug_rhs
        } else {
            &self.rules[rule].rhs
        }
    }

    fn lhs_of(&self, rule: usize) -> Option<SymbolId> {
        self.rules.get(rule).map(|r| r.lhs)
    }

    fn compute_first(&mut self) {
        for (idx, info) in self.symbols.iter().enumerate() {
            if info.kind != SymbolKind::NonTerminal {
                let id = SymbolId(u16::try_from(idx).unwrap_or(u16::MAX));
                self.first[idx].insert(id);
            }
        }
        loop {
            let mut changed = false;
            for rule in self.rules {
                let lhs = rule.lhs.index();
                let mut all_nullable = true;
                for &symbol in &rule.rhs {
                    let additions: Vec<SymbolId> =
                        self.first[symbol.index()].iter().copied().collect();
                    for sym in additions {
                        changed |= self.first[lhs].insert(sym);
                    }
                    if !self.nullable[symbol.index()] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !self.nullable[lhs] {
                    self.nullable[lhs] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn compute_follow(&mut self) {
        self.follow[self.start.index()].insert(SymbolId::END);
        loop {
            let mut changed = false;
            for rule in self.rules {
                for (pos, &symbol) in rule.rhs.iter().enumerate() {
                    if !self.is_nonterminal(symbol) {
                        continue;
                    }
                    let mut rest_nullable = true;
                    for &after in &rule.rhs[pos + 1..] {
                        let additions: Vec<SymbolId> =
                            self.first[after.index()].iter().copied().collect();
                        for sym in additions {
                            changed |= self.follow[symbol.index()].insert(sym);
                        }
                        if !self.nullable[after.index()] {
                            rest_nullable = false;
                            break;
                        }
                    }
                    if rest_nullable {
                        let additions: Vec<SymbolId> =
                            self.follow[rule.lhs.index()].iter().copied().collect();
                        for sym in additions {
                            changed |= self.follow[symbol.index()].insert(sym);
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn closure(&self, mut items: BTreeSet<Item>) -> BTreeSet<Item> {
        let mut stack: Vec<Item> = items.iter().copied().collect();
        while let Some((rule, dot)) = stack.pop() {
            let rhs = self.rhs_of(rule);
            let Some(&next) = rhs.get(dot) else { continue };
            if !self.is_nonterminal(next) {
                continue;
            }
            for (idx, candidate) in self.rules.iter().enumerate() {
                if candidate.lhs == next && items.insert((idx, 0)) {
                    stack.push((idx, 0));
                }
            }
        }
        items
    }

    fn goto(&self, items: &BTreeSet<Item>, symbol: SymbolId) -> BTreeSet<Item> {
        let mut kernel = BTreeSet::new();
        for &(rule, dot) in items {
            if self.rhs_of(rule).get(dot) == Some(&symbol) {
                kernel.insert((rule, dot + 1));
            }
        }
        self.closure(kernel)
    }

    fn effective_rule_prec(&self, rule: usize) -> Option<(i16, Associativity)> {
        let decl = self.rules.get(rule)?;
        if decl.precedence.is_some() {
            return decl.precedence;
        }
        decl.rhs
            .iter()
            .rev()
            .find_map(|symbol| self.terminal_prec.get(symbol).copied())
    }

    fn build(&self) -> ParseTable {
        let augmented = self.rules.len();
        let mut sets: Vec<BTreeSet<Item>> = Vec::new();
        let mut ids: HashMap<Vec<Item>, usize, ahash::RandomState> = HashMap::default();
        let mut transitions: Vec<Vec<(SymbolId, usize)>> = Vec::new();

        let initial = self.closure(BTreeSet::from([(augmented, 0)]));
        ids.insert(initial.iter().copied().collect(), 0);
        sets.push(initial);

        let mut next = 0usize;
        while next < sets.len() {
            let items = sets[next].clone();
            let mut outgoing: Vec<(SymbolId, usize)> = Vec::new();
            let mut seen: BTreeSet<SymbolId> = BTreeSet::new();
            for &(rule, dot) in &items {
                if let Some(&symbol) = self.rhs_of(rule).get(dot) {
                    seen.insert(symbol);
                }
            }
            for symbol in seen {
                let target_set = self.goto(&items, symbol);
                let key: Vec<Item> = target_set.iter().copied().collect();
                let target = match ids.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = sets.len();
                        ids.insert(key, id);
                        sets.push(target_set);
                        id
                    }
                };
                outgoing.push((symbol, target));
            }
            transitions.push(outgoing);
            next += 1;
        }

        let mut table = ParseTable::new(self.start);
        for rule in self.rules {
            let (precedence, associativity) = rule
                .precedence
                .or_else(|| {
                    rule.rhs
                        .iter()
                        .rev()
                        .find_map(|symbol| self.terminal_prec.get(symbol).copied())
                })
                .unwrap_or((0, Associativity::NonAssoc));
            table.push_production(
                Production::new(rule.lhs, u8::try_from(rule.rhs.len()).unwrap_or(u8::MAX))
                    .with_precedence(precedence, associativity),
            );
        }

        for (idx, items) in sets.iter().enumerate() {
            let mut state = ParseState::new();

            // Shift candidates, by terminal.
            let mut shifts: Vec<(SymbolId, usize)> = Vec::new();
            for &(symbol, target) in &transitions[idx] {
                if self.is_nonterminal(symbol) {
                    state.add_goto(symbol, crate::language::StateId(u32::try_from(target).unwrap_or(u32::MAX)));
                } else {
                    shifts.push((symbol, target));
                }
            }

            // Reduce candidates, by lookahead.
            let mut reduces: HashMap<SymbolId, Vec<usize>, ahash::RandomState> =
                HashMap::default();
            let mut accept_on_end = false;
            for &(rule, dot) in items {
                if dot != self.rhs_of(rule).len() {
                    continue;
                }
                if rule == augmented {
                    accept_on_end = true;
                    continue;
                }
                if let Some(lhs) = self.lhs_of(rule) {
                    for &lookahead in &self.follow[lhs.index()] {
                        reduces.entry(lookahead).or_default().push(rule);
                    }
                }
            }
            for rules in reduces.values_mut() {
                rules.sort_unstable();
                rules.dedup();
            }

            if accept_on_end {
                state.add_action(SymbolId::END, ParseAction::Accept);
            }

            // Emit shift/reduce per lookahead with precedence resolution.
            let mut lookaheads: BTreeSet<SymbolId> = BTreeSet::new();
            for &(symbol, _) in &shifts {
                lookaheads.insert(symbol);
            }
            for &symbol in reduces.keys() {
                lookaheads.insert(symbol);
            }

            for lookahead in lookaheads {
                let shift = shifts
                    .iter()
                    .find(|(symbol, _)| *symbol == lookahead)
                    .map(|&(_, target)| target);
                let empty = Vec::new();
                let rules = reduces.get(&lookahead).unwrap_or(&empty);

                let mut keep_shift = shift.is_some();
                let mut kept_rules: Vec<usize> = Vec::new();
                for &rule in rules {
                    match self.resolve(lookahead, rule, shift.is_some()) {
                        Resolution::Shift => {}
                        Resolution::Reduce => {
                            keep_shift = false;
                            kept_rules.push(rule);
                        }
                        Resolution::Both => kept_rules.push(rule),
                    }
                }

                if keep_shift {
                    if let Some(target) = shift {
                        state.add_action(
                            lookahead,
                            ParseAction::Shift(crate::language::StateId(
                                u32::try_from(target).unwrap_or(u32::MAX),
                            )),
                        );
                    }
                }
                for rule in kept_rules {
                    state.add_action(
                        lookahead,
                        ParseAction::Reduce(crate::language::ProductionId(
                            u16::try_from(rule).unwrap_or(u16::MAX),
                        )),
                    );
                }
            }

            // External terminals valid in this state. A token that only
            // appears as a reduce lookahead still has to be recognizable, so
            // both shift targets and reduce keys count.
            let mut externals: BTreeSet<SymbolId> = BTreeSet::new();
            for &(symbol, _) in &shifts {
                externals.insert(symbol);
            }
            for &symbol in reduces.keys() {
                externals.insert(symbol);
            }
            for symbol in externals {
                if self
                    .symbols
                    .get(symbol.index())
                    .is_some_and(|info| info.kind == SymbolKind::External)
                {
                    state.add_external_token(symbol);
                }
            }

            table.push_state(state);
        }

        table
    }

    fn resolve(&self, lookahead: SymbolId, rule: usize, has_shift: bool) -> Resolution {
        if !has_shift {
            return Resolution::Both;
        }
        let shift_prec = self.terminal_prec.get(&lookahead).copied();
        let rule_prec = self.effective_rule_prec(rule);
        match (shift_prec, rule_prec) {
            (Some((sp, _)), Some((rp, assoc))) => {
                if rp > sp {
                    Resolution::Reduce
                } else if sp > rp {
                    Resolution::Shift
                } else {
                    match assoc {
                        Associativity::Left => Resolution::Reduce,
                        Associativity::Right => Resolution::Shift,
                        Associativity::NonAssoc => Resolution::Both,
                    }
                }
            }
            _ => Resolution::Both,
        }
    }
}

enum Resolution {
    Shift,
    Reduce,
    /// Unresolved; emitted as a declared conflict.
    Both,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::StateId;

    #[test]
    fn builds_a_plain_lr_grammar() {
        let mut g = GrammarBuilder::new();
        let number = g.terminal("number", Pattern::repeat(Pattern::class(&[(b'0', b'9')])));
        let plus = g.terminal_with_prec("plus", Pattern::literal("+"), 1, Associativity::Left);
        let expr = g.nonterminal("expr");
        g.start(expr);
        g.rule(expr, &[expr, plus, expr]);
        g.rule(expr, &[number]);

        let language = g.build().expect("grammar compiles");
        let table = language.parse_table();
        assert!(table.state_count() > 2);

        // The start state must shift a number.
        let actions = table.state(StateId::START).actions(number);
        assert!(matches!(actions.first(), Some(ParseAction::Shift(_))));
        // Left associativity resolves the + conflict to a single action.
        let mut conflict_free = true;
        for idx in 0..table.state_count() {
            let state = table.state(StateId(u32::try_from(idx).unwrap_or(0)));
            if state.actions(plus).len() > 1 {
                conflict_free = false;
            }
        }
        assert!(conflict_free);
    }

    #[test]
    fn unresolved_conflicts_become_multi_actions() {
        let mut g = GrammarBuilder::new();
        let number = g.terminal("number", Pattern::repeat(Pattern::class(&[(b'0', b'9')])));
        let plus = g.terminal("plus", Pattern::literal("+"));
        let expr = g.nonterminal("expr");
        g.start(expr);
        g.rule(expr, &[expr, plus, expr]);
        g.rule(expr, &[number]);

        let language = g.build().expect("grammar compiles");
        let table = language.parse_table();
        let conflicted = (0..table.state_count()).any(|idx| {
            table
                .state(StateId(u32::try_from(idx).unwrap_or(0)))
                .actions(plus)
                .len()
                > 1
        });
        assert!(conflicted);
    }

    #[test]
    fn missing_start_symbol_is_rejected() {
        let mut g = GrammarBuilder::new();
        let _ = g.terminal("number", Pattern::repeat(Pattern::class(&[(b'0', b'9')])));
        assert!(g.build().is_err());
    }
}
