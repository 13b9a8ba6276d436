//! Error recovery.
//!
//! A parse never fails outright. When no stack has an action for the
//! lookahead, the runner collapses to its best stack and repairs in three
//! escalating ways:
//!
//! 1. insert a zero-length missing token the state can shift (end of input
//!    only, bounded per episode),
//! 2. skip forward a bounded number of tokens, folding the skipped spans
//!    into an error node, until a token the current state can act on,
//! 3. pop stack entries into the error node until an uncovered state can
//!    act, or, with nothing left, wrap everything into an error-marked root.
//!
//! Folding always targets the surviving top entry's element list, so the
//! one-entry-per-symbol stack shape the reducer relies on is preserved.

use crate::error::ParseStatus;
use crate::language::SymbolId;
use crate::lexer::Lexeme;
use crate::parser::automaton::{Element, RunOutcome, Runner, StackEntry};
use crate::syntax::{GreenToken, NodeFlags};
use tracing::debug;

/// How recovery left the runner.
pub(super) enum Recovery {
    /// The stack was repaired; the main loop continues.
    Resumed,
    /// Recovery had to end the parse; the outcome is final.
    Finished(RunOutcome),
}

/// Most missing tokens inserted without consuming real input.
const MAX_INSERTIONS: u32 = 4;

impl Runner<'_> {
    pub(super) fn recover(&mut self, offending: Lexeme) -> Recovery {
        debug!(symbol = offending.symbol.0, at = %offending.range.start(), "entering recovery");
        if offending.is_end() {
            self.recover_at_end(offending)
        } else {
            self.recover_mid_input(offending)
        }
    }

    /// End of input arrived while the grammar still expected something.
    fn recover_at_end(&mut self, end: Lexeme) -> Recovery {
        if self.insertions < MAX_INSERTIONS {
            if let Some(symbol) = self.missing_candidate() {
                self.insert_missing(symbol);
                self.lookback = Some(end);
                return Recovery::Resumed;
            }
        }

        // Pop entries into an error node until a state can act on END.
        let mut err: Vec<Element> = std::mem::take(&mut self.pending_trivia);
        loop {
            let state = self.language.parse_table().state(self.stacks[0].state());
            if state.has_action(SymbolId::END) {
                self.fold_error(err);
                self.lookback = Some(end);
                return Recovery::Resumed;
            }
            if self.stacks[0].entries.len() > 1 {
                let popped = self.pop_top_entry();
                let mut combined = popped.elements;
                combined.append(&mut err);
                err = combined;
            } else {
                self.fold_error(err);
                return Recovery::Finished(self.finalize_partial(ParseStatus::ErrorsPresent));
            }
        }
    }

    /// Skip forward looking for a token the parse can pick up from.
    fn recover_mid_input(&mut self, offending: Lexeme) -> Recovery {
        let mut err: Vec<Element> = std::mem::take(&mut self.pending_trivia);
        let offending_element = self.token_element(&offending);
        err.push(offending_element);

        let mut held_trivia: Vec<Element> = Vec::new();
        let mut skipped = 0u32;
        loop {
            if !self.budget.spend() {
                self.exhausted = true;
                err.append(&mut held_trivia);
                self.fold_error(err);
                return Recovery::Finished(self.finalize_timeout());
            }

            let state_id = self.stacks[0].state();
            let state = self.language.parse_table().state(state_id);
            let lexeme = self.scanner.next(state);

            if lexeme.is_trivia {
                let element = self.token_element(&lexeme);
                held_trivia.push(element);
                continue;
            }

            if lexeme.is_end() {
                err.append(&mut held_trivia);
                self.fold_error(err);
                return self.recover_at_end(lexeme);
            }

            if state.has_action(lexeme.symbol) {
                self.fold_error(err);
                self.pending_trivia = held_trivia;
                self.lookback = Some(lexeme);
                return Recovery::Resumed;
            }

            err.append(&mut held_trivia);
            let element = self.token_element(&lexeme);
            err.push(element);
            skipped += 1;

            if skipped >= self.resync_limit {
                return self.pop_resync(err);
            }
        }
    }

    /// Skipping found nothing; pop entries until an uncovered state can act
    /// on the next token in the input.
    fn pop_resync(&mut self, mut err: Vec<Element>) -> Recovery {
        let Some(next) = self.next_significant() else {
            self.fold_error(err);
            return Recovery::Finished(self.finalize_timeout());
        };

        loop {
            let state = self.language.parse_table().state(self.stacks[0].state());
            let can_act = if next.is_end() {
                state.has_action(SymbolId::END)
            } else {
                state.has_action(next.symbol)
            };
            if can_act {
                self.fold_error(err);
                self.lookback = Some(next);
                return Recovery::Resumed;
            }
            if self.stacks[0].entries.len() > 1 {
                let popped = self.pop_top_entry();
                let mut combined = popped.elements;
                combined.append(&mut err);
                err = combined;
            } else {
                if !next.is_end() {
                    let element = self.token_element(&next);
                    err.push(element);
                }
                self.fold_error(err);
                return Recovery::Finished(self.finalize_partial(ParseStatus::ErrorsPresent));
            }
        }
    }

    /// The lowest-numbered terminal the current state can shift, used as the
    /// missing-token candidate. Deterministic across runs by construction.
    fn missing_candidate(&self) -> Option<SymbolId> {
        let state = self.language.parse_table().state(self.stacks[0].state());
        state
            .lookaheads()
            .filter(|&symbol| {
                symbol != SymbolId::END
                    && !symbol.is_error()
                    && self.language.is_terminal(symbol)
                    && state
                        .actions(symbol)
                        .first()
                        .is_some_and(|action| matches!(action, crate::language::ParseAction::Shift(_)))
            })
            .min()
    }

    /// Shift a zero-length missing token so the parse can make progress.
    fn insert_missing(&mut self, symbol: SymbolId) {
        let state_id = self.stacks[0].state();
        let state = self.language.parse_table().state(state_id);
        let Some(crate::language::ParseAction::Shift(target)) =
            state.actions(symbol).first().copied()
        else {
            return;
        };

        debug!(symbol = symbol.0, "inserting missing token");
        self.insertions += 1;
        let ext = self.scanner.external_state();
        let element = Element {
            green: GreenToken::missing(symbol).into(),
            lookahead: 0,
            ext_before: ext.clone(),
            ext_after: ext,
        };
        self.stacks[0].entries.push(StackEntry {
            state: target,
            start_state: state_id,
            elements: vec![element],
        });
    }

    /// Wrap accumulated elements into an error node glued to the top entry.
    fn fold_error(&mut self, elements: Vec<Element>) {
        if elements.is_empty() {
            return;
        }
        let state_id = self.stacks[0].state();
        let element = self.build_node(SymbolId::ERROR, state_id, elements, NodeFlags::ERROR);
        if let Some(top) = self.stacks[0].entries.last_mut() {
            top.elements.push(element);
        }
    }

    fn pop_top_entry(&mut self) -> StackEntry {
        let entries = &mut self.stacks[0].entries;
        debug_assert!(entries.len() > 1, "never pops the sentinel");
        entries.pop().unwrap_or_else(StackEntry::sentinel)
    }
}
