//! The table-driven shift/reduce engine.
//!
//! One [`Runner`] drives one parse request: it pulls tokens from the
//! scanner, applies actions from the parse table across one or more stacks
//! (more than one only while a declared conflict is being explored), folds
//! shifted tokens and reduced nodes into green elements, and finally wraps
//! whatever the stacks hold into a root that tiles the whole buffer.
//!
//! Stack shape invariant: `entries[0]` is a sentinel for the start state and
//! is never popped. Every later entry corresponds to exactly one shifted
//! symbol, so a reduction of a length-`n` production pops exactly `n`
//! entries. Trivia and error elements ride inside entries rather than
//! occupying their own, which keeps that correspondence exact.

use crate::error::{LexError, ParseStatus};
use crate::incremental::ReuseSource;
use crate::language::{
    Language, ParseAction, ProductionId, ScannerSnapshot, StateId, SymbolId,
};
use crate::lexer::{Lexeme, Scanner};
use crate::parser::budget::BudgetTracker;
use crate::parser::fork::{ForkPolicy, ForkTieBreak};
use crate::parser::recovery::Recovery;
use crate::syntax::{GreenElement, GreenNode, GreenToken, NodeFlags, TextRange, TextSize};
use std::sync::Arc;
use tracing::{debug, trace};

/// A green element plus the scan bookkeeping the reconciler will need.
#[derive(Clone)]
pub(super) struct Element {
    pub green: GreenElement,
    /// Bytes examined past the element's end while producing it.
    pub lookahead: u32,
    pub ext_before: Option<Box<[u8]>>,
    pub ext_after: Option<Box<[u8]>>,
}

#[derive(Clone)]
pub(super) struct StackEntry {
    /// Automaton state after this entry's symbol was consumed.
    pub state: StateId,
    /// Automaton state in which this entry's first token was shifted.
    pub start_state: StateId,
    pub elements: Vec<Element>,
}

impl StackEntry {
    pub(super) fn sentinel() -> Self {
        Self {
            state: StateId::START,
            start_state: StateId::START,
            elements: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub(super) struct ParseStack {
    pub entries: Vec<StackEntry>,
    /// Sum of the precedences of every production reduced so far; used by
    /// [`ForkTieBreak::HigherPrecedence`].
    pub dynamic_precedence: i64,
    /// Index of the conflict action this fork took; lower was declared first.
    pub fork_order: usize,
    /// Token count when this fork split off.
    pub born_at: u32,
}

impl ParseStack {
    fn new() -> Self {
        Self {
            entries: vec![StackEntry::sentinel()],
            dynamic_precedence: 0,
            fork_order: 0,
            born_at: 0,
        }
    }

    pub(super) fn state(&self) -> StateId {
        self.entries.last().map_or(StateId::START, |e| e.state)
    }

    fn signature(&self) -> Vec<StateId> {
        self.entries.iter().map(|e| e.state).collect()
    }
}

pub(crate) enum RunOutcome {
    Tree {
        root: Arc<GreenNode>,
        status: ParseStatus,
        lex_errors: Vec<LexError>,
    },
    /// A reused subtree led straight into a parse error; the caller should
    /// rerun without reuse.
    Mismatch,
}

enum TokenOutcome {
    Consumed,
    Accepted,
    Stuck,
}

pub(super) struct Runner<'a> {
    pub language: &'a Language,
    pub scanner: Scanner<'a>,
    pub stacks: Vec<ParseStack>,
    pub pending_trivia: Vec<Element>,
    pub policy: ForkPolicy,
    pub budget: BudgetTracker,
    /// Most tokens a resynchronization scan may skip.
    pub resync_limit: u32,
    pub reuse: Option<ReuseSource<'a>>,
    /// Pushed-back lookahead, consumed before the scanner is asked again.
    pub lookback: Option<Lexeme>,
    pub token_count: u32,
    pub saw_error: bool,
    /// Set right after a reused subtree is pushed; a parse error while this
    /// is set aborts to a from-scratch rerun instead of recovering.
    pub just_reused: bool,
    /// Budget exhaustion noticed somewhere other than the loop head.
    pub exhausted: bool,
    /// Missing tokens inserted since the last real shift.
    pub insertions: u32,
    pub text_len: TextSize,
}

impl<'a> Runner<'a> {
    pub(super) fn new(
        language: &'a Language,
        text: &'a str,
        policy: ForkPolicy,
        budget: BudgetTracker,
        resync_limit: u32,
        reuse: Option<ReuseSource<'a>>,
    ) -> Self {
        Self {
            language,
            scanner: Scanner::new(language, text),
            stacks: vec![ParseStack::new()],
            pending_trivia: Vec::new(),
            policy,
            budget,
            resync_limit,
            reuse,
            lookback: None,
            token_count: 0,
            saw_error: false,
            just_reused: false,
            exhausted: false,
            insertions: 0,
            text_len: TextSize::of(text),
        }
    }

    pub(super) fn run(&mut self) -> RunOutcome {
        loop {
            if self.exhausted || !self.budget.spend() {
                return self.finalize_timeout();
            }

            if self.stacks.len() == 1 && self.lookback.is_none() {
                if self.try_reuse() {
                    continue;
                }
            }

            let Some(lexeme) = self.next_significant() else {
                return self.finalize_timeout();
            };
            self.token_count += 1;

            match self.step_all(&lexeme) {
                TokenOutcome::Consumed => {
                    self.just_reused = false;
                    self.insertions = 0;
                }
                TokenOutcome::Accepted => {
                    return self.finalize_accept();
                }
                TokenOutcome::Stuck => {
                    if self.exhausted {
                        // Put the scanned token back so the partial root
                        // still tiles the buffer.
                        self.lookback = Some(lexeme);
                        return self.finalize_timeout();
                    }
                    if self.just_reused {
                        debug!("parse error immediately after subtree reuse; rerunning");
                        return RunOutcome::Mismatch;
                    }
                    self.saw_error = true;
                    match self.recover(lexeme) {
                        Recovery::Resumed => {}
                        Recovery::Finished(outcome) => return outcome,
                    }
                }
            }
        }
    }

    /// Pull the next non-trivia lexeme, buffering trivia for the next shift.
    /// `None` means the budget ran out mid-scan.
    pub(super) fn next_significant(&mut self) -> Option<Lexeme> {
        if let Some(lexeme) = self.lookback.take() {
            return Some(lexeme);
        }
        loop {
            let state_id = self.stacks[0].state();
            let state = self.language.parse_table().state(state_id);
            let lexeme = self.scanner.next(state);
            if lexeme.is_trivia {
                let element = self.token_element(&lexeme);
                self.pending_trivia.push(element);
                if !self.budget.spend() {
                    self.exhausted = true;
                    return None;
                }
                continue;
            }
            return Some(lexeme);
        }
    }

    pub(super) fn token_element(&self, lexeme: &Lexeme) -> Element {
        let text = self.scanner.text_of(lexeme.range);
        let green = if lexeme.invalid {
            GreenToken::invalid(text)
        } else {
            GreenToken::new(lexeme.symbol, text)
        };
        Element {
            green: green.into(),
            lookahead: lexeme.lookahead,
            ext_before: lexeme.ext_before.clone(),
            ext_after: lexeme.ext_after.clone(),
        }
    }

    /// Advance every live stack over one lexeme: run reductions, forking on
    /// declared conflicts, then shift into the survivors.
    fn step_all(&mut self, lexeme: &Lexeme) -> TokenOutcome {
        let mut worklist = std::mem::take(&mut self.stacks);
        let mut shifting: Vec<(ParseStack, StateId)> = Vec::new();
        let mut accepted: Vec<ParseStack> = Vec::new();
        let mut dead: Vec<ParseStack> = Vec::new();

        while let Some(stack) = worklist.pop() {
            self.settle(
                stack,
                lexeme.symbol,
                &mut worklist,
                &mut shifting,
                &mut accepted,
                &mut dead,
            );
        }

        if !accepted.is_empty() {
            self.stacks = vec![pick_winner(self.policy.tie_break, accepted)];
            return TokenOutcome::Accepted;
        }

        if shifting.is_empty() {
            // Keep the best dead stack so recovery has something to work on.
            self.stacks = vec![pick_winner(self.policy.tie_break, dead)];
            return TokenOutcome::Stuck;
        }

        let token = self.token_element(lexeme);
        let trivia = std::mem::take(&mut self.pending_trivia);
        self.stacks = shifting
            .into_iter()
            .map(|(mut stack, target)| {
                let start_state = stack.state();
                let mut elements = trivia.clone();
                elements.push(token.clone());
                stack.entries.push(StackEntry {
                    state: target,
                    start_state,
                    elements,
                });
                stack
            })
            .collect();

        self.converge();
        TokenOutcome::Consumed
    }

    /// Run reductions on one stack until it is ready to shift, accepts, or
    /// dies. Conflict alternatives are materialized as fork stacks: reduce
    /// forks go back on the worklist, shift and accept forks go straight to
    /// their buckets.
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &mut self,
        mut stack: ParseStack,
        symbol: SymbolId,
        worklist: &mut Vec<ParseStack>,
        shifting: &mut Vec<(ParseStack, StateId)>,
        accepted: &mut Vec<ParseStack>,
        dead: &mut Vec<ParseStack>,
    ) {
        loop {
            if !self.budget.spend() {
                self.exhausted = true;
                dead.push(stack);
                return;
            }
            let state = self.language.parse_table().state(stack.state());
            let actions = state.actions(symbol);
            let Some(&first) = actions.first() else {
                dead.push(stack);
                return;
            };

            if actions.len() > 1 && self.policy.max_forks > 1 {
                let live = 1 + worklist.len() + shifting.len() + accepted.len();
                let room = self.policy.max_forks.saturating_sub(live);
                for (index, &action) in actions.iter().enumerate().skip(1).take(room) {
                    let mut fork = stack.clone();
                    fork.fork_order = fork.fork_order.max(index);
                    fork.born_at = self.token_count;
                    trace!(?action, "forking on declared conflict");
                    match action {
                        ParseAction::Shift(target) => shifting.push((fork, target)),
                        ParseAction::Accept => accepted.push(fork),
                        ParseAction::Reduce(production) => {
                            if self.reduce(&mut fork, production) {
                                worklist.push(fork);
                            } else {
                                dead.push(fork);
                            }
                        }
                    }
                }
            }

            match first {
                ParseAction::Shift(target) => {
                    shifting.push((stack, target));
                    return;
                }
                ParseAction::Accept => {
                    accepted.push(stack);
                    return;
                }
                ParseAction::Reduce(production) => {
                    if !self.reduce(&mut stack, production) {
                        dead.push(stack);
                        return;
                    }
                }
            }
        }
    }

    /// Pop `production.len` entries, build the node, push it via goto.
    /// Returns `false` when the table leaves no viable goto (the stack dies).
    pub(super) fn reduce(&mut self, stack: &mut ParseStack, id: ProductionId) -> bool {
        let production = *self.language.parse_table().production(id);
        let len = production.len as usize;
        if len >= stack.entries.len() {
            // Would pop the sentinel; the table disagrees with the stack.
            // Treat as a dead end rather than corrupting the shape invariant.
            return false;
        }

        let split = stack.entries.len() - len;
        let popped: Vec<StackEntry> = stack.entries.split_off(split);
        let start_state = popped
            .first()
            .map_or_else(|| stack.state(), |entry| entry.start_state);

        let mut elements: Vec<Element> = Vec::new();
        for entry in popped {
            elements.extend(entry.elements);
        }

        let node_element = self.build_node(production.lhs, start_state, elements, NodeFlags::NONE);
        let Some(target) = self
            .language
            .parse_table()
            .state(stack.state())
            .goto(production.lhs)
        else {
            return false;
        };

        stack.dynamic_precedence += i64::from(production.precedence);
        stack.entries.push(StackEntry {
            state: target,
            start_state,
            elements: vec![node_element],
        });
        true
    }

    /// Assemble a green node from collected elements, computing the reuse
    /// metadata as it goes.
    pub(super) fn build_node(
        &self,
        symbol: SymbolId,
        start_state: StateId,
        elements: Vec<Element>,
        extra_flags: NodeFlags,
    ) -> Element {
        let mut rel_end = 0u32;
        let mut max_reach = 0u32;
        for element in &elements {
            rel_end += u32::from(element.green.text_len());
            max_reach = max_reach.max(rel_end + element.lookahead);
        }
        let lookahead = max_reach.saturating_sub(rel_end);

        let ext_before = elements.first().and_then(|e| e.ext_before.clone());
        let ext_after = elements.last().and_then(|e| e.ext_after.clone());
        let snapshot = if self.language.has_external_scanner() {
            Some(Arc::new(ScannerSnapshot {
                at_start: ext_before.clone().unwrap_or_default(),
                at_end: ext_after.clone().unwrap_or_default(),
            }))
        } else {
            None
        };

        let greens = elements.into_iter().map(|e| e.green).collect();
        let node =
            GreenNode::with_metadata(symbol, greens, start_state, lookahead, snapshot, extra_flags);
        Element {
            green: node.into(),
            lookahead,
            ext_before,
            ext_after,
        }
    }

    /// Merge stacks that have reconverged and enforce the fork window.
    fn converge(&mut self) {
        if self.stacks.len() <= 1 {
            return;
        }

        let tie_break = self.policy.tie_break;
        let mut kept: Vec<ParseStack> = Vec::with_capacity(self.stacks.len());
        for stack in std::mem::take(&mut self.stacks) {
            let signature = stack.signature();
            match kept.iter_mut().find(|k| k.signature() == signature) {
                Some(existing) => {
                    trace!("merging reconverged fork");
                    if prefers(tie_break, &stack, existing) {
                        *existing = stack;
                    }
                }
                None => kept.push(stack),
            }
        }

        let expired = kept.len() > 1
            && kept.iter().any(|stack| {
                self.token_count.saturating_sub(stack.born_at) > self.policy.window_tokens
            });
        if expired {
            debug!(live = kept.len(), "fork window expired; collapsing");
            self.stacks = vec![pick_winner(tie_break, kept)];
        } else {
            self.stacks = kept;
        }
    }

    /// Try to push a subtree from the previous parse instead of lexing.
    fn try_reuse(&mut self) -> bool {
        let Some(reuse) = self.reuse.as_mut() else {
            return false;
        };
        let state_id = self.stacks[0].state();
        let state = self.language.parse_table().state(state_id);
        let pos = self.scanner.position();
        let ext = if self.language.has_external_scanner() {
            self.scanner.external_state()
        } else {
            None
        };

        let Some(node) = reuse.candidate(pos, state_id, state, ext.as_deref()) else {
            return false;
        };
        let Some(target) = state.goto(node.symbol()) else {
            return false;
        };

        let len = node.text_len();
        debug!(pos = %pos, len = %len, "reusing subtree");
        let snapshot = node.scanner_snapshot().cloned();
        let element = Element {
            lookahead: node.lookahead_bytes(),
            ext_before: snapshot.as_ref().map(|s| s.at_start.clone()),
            ext_after: snapshot.as_ref().map(|s| s.at_end.clone()),
            green: node.into(),
        };
        let mut elements = std::mem::take(&mut self.pending_trivia);
        elements.push(element);

        self.scanner
            .seek(pos + len, snapshot.as_ref().map(|s| s.at_end.as_ref()));
        self.stacks[0].entries.push(StackEntry {
            state: target,
            start_state: state_id,
            elements,
        });
        self.just_reused = true;
        true
    }

    /// Every element sitting on a stack, sentinel included, in source order.
    fn drain_elements(stack: ParseStack) -> Vec<Element> {
        let mut out = Vec::new();
        for entry in stack.entries {
            out.extend(entry.elements);
        }
        out
    }

    fn finalize_accept(&mut self) -> RunOutcome {
        let stack = self.stacks.pop().unwrap_or_else(ParseStack::new);
        let mut elements = Self::drain_elements(stack);
        elements.append(&mut self.pending_trivia);

        let root = self.into_root(elements);
        let status = if self.saw_error || root.has_error() {
            ParseStatus::ErrorsPresent
        } else {
            ParseStatus::Ok
        };
        debug!(len = %root.text_len(), ?status, "parse accepted");
        RunOutcome::Tree {
            root,
            status,
            lex_errors: self.scanner.take_errors(),
        }
    }

    /// Build the root node. A lone start-symbol node is used directly;
    /// trailing trivia are folded into its children; any other leftover
    /// shape is wrapped in a fresh start-symbol node.
    fn into_root(&self, mut elements: Vec<Element>) -> Arc<GreenNode> {
        let start_symbol = self.language.parse_table().start_symbol();
        let head_is_start = elements.first().is_some_and(|element| {
            element
                .green
                .as_node()
                .is_some_and(|node| node.symbol() == start_symbol)
        });
        let tail_is_trivia = elements.get(1..).map_or(true, |tail| {
            tail.iter().all(|element| {
                element
                    .green
                    .as_token()
                    .is_some_and(|token| self.language.is_trivia(token.symbol()))
            })
        });

        if head_is_start && tail_is_trivia {
            let mut iter = elements.into_iter();
            match iter.next() {
                Some(Element {
                    green: GreenElement::Node(node),
                    ..
                }) => {
                    if node.text_len() == self.text_len {
                        return node;
                    }
                    let mut children: Vec<GreenElement> = node.children().to_vec();
                    let mut lookahead = node.lookahead_bytes();
                    let snapshot = node.scanner_snapshot().cloned();
                    for element in iter {
                        lookahead = lookahead.max(element.lookahead);
                        children.push(element.green);
                    }
                    return GreenNode::with_metadata(
                        node.symbol(),
                        children,
                        node.parse_state(),
                        lookahead,
                        snapshot,
                        NodeFlags::NONE,
                    );
                }
                head => elements = head.into_iter().chain(iter).collect(),
            }
        }

        let element = self.build_node(start_symbol, StateId::START, elements, NodeFlags::NONE);
        match element.green {
            GreenElement::Node(node) => node,
            // build_node always yields a node; keep a tiling tree even if
            // that ever changes.
            GreenElement::Token(_) => GreenNode::new(start_symbol, Vec::new(), StateId::START),
        }
    }

    pub(super) fn finalize_timeout(&mut self) -> RunOutcome {
        self.finalize_partial(ParseStatus::TimedOut)
    }

    /// Wrap everything consumed so far, plus the unconsumed remainder as one
    /// raw error leaf, into a tiling root.
    pub(super) fn finalize_partial(&mut self, status: ParseStatus) -> RunOutcome {
        let stack = pick_winner(self.policy.tie_break, std::mem::take(&mut self.stacks));
        let mut elements = Self::drain_elements(stack);
        elements.append(&mut self.pending_trivia);
        if let Some(lexeme) = self.lookback.take() {
            if !lexeme.is_end() {
                let element = self.token_element(&lexeme);
                elements.push(element);
            }
        }

        let consumed = self.scanner.position();
        if consumed < self.text_len {
            let rest = self.scanner.text_of(TextRange::new(consumed, self.text_len));
            elements.push(Element {
                green: GreenToken::invalid(rest).into(),
                lookahead: 0,
                ext_before: None,
                ext_after: None,
            });
        }

        let start_symbol = self.language.parse_table().start_symbol();
        let element = self.build_node(start_symbol, StateId::START, elements, NodeFlags::NONE);
        let root = match element.green {
            GreenElement::Node(node) => node,
            GreenElement::Token(_) => GreenNode::new(start_symbol, Vec::new(), StateId::START),
        };
        debug!(consumed = %consumed, ?status, "parse stopped early");
        RunOutcome::Tree {
            root,
            status,
            lex_errors: self.scanner.take_errors(),
        }
    }
}

fn prefers(tie_break: ForkTieBreak, a: &ParseStack, b: &ParseStack) -> bool {
    match tie_break {
        ForkTieBreak::HigherPrecedence => {
            (a.dynamic_precedence, std::cmp::Reverse(a.fork_order))
                > (b.dynamic_precedence, std::cmp::Reverse(b.fork_order))
        }
        ForkTieBreak::FirstDeclared => a.fork_order < b.fork_order,
    }
}

fn pick_winner(tie_break: ForkTieBreak, mut stacks: Vec<ParseStack>) -> ParseStack {
    let mut best = stacks.pop().unwrap_or_else(ParseStack::new);
    for stack in stacks {
        if prefers(tie_break, &stack, &best) {
            best = stack;
        }
    }
    best
}
