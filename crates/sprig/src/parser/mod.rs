//! # The parse automaton
//!
//! [`Parser`] is the engine's front door: give it a language descriptor and
//! feed it buffers. Parsing is table-driven LR with three extensions layered
//! on top of the plain shift/reduce loop:
//!
//! - bounded forking over declared conflicts ([`ForkPolicy`]),
//! - error recovery that absorbs failures into the tree instead of
//!   returning them,
//! - subtree reuse from a previous tree with recorded edits.
//!
//! A parse request always yields a tree tiling the whole buffer; see
//! [`ParseStatus`](crate::ParseStatus) for how far to trust it.

mod automaton;
mod budget;
mod fork;
mod recovery;

pub use budget::ParseBudget;
pub use fork::{ForkPolicy, ForkTieBreak};

use crate::error::ParseStatus;
use crate::incremental::ReuseSource;
use crate::language::{LanguageRef, StateId};
use crate::syntax::{GreenNode, LineIndex, SyntaxTree};
use automaton::{RunOutcome, Runner};
use std::sync::Arc;
use tracing::debug;

/// Per-request knobs. The defaults suit interactive use.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub budget: ParseBudget,
    pub fork: ForkPolicy,
    /// Most tokens a resynchronization scan may skip before recovery falls
    /// back to popping the stack.
    pub recovery_lookahead: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            budget: ParseBudget::default(),
            fork: ForkPolicy::default(),
            recovery_lookahead: 64,
        }
    }
}

/// A reusable parsing session for one language.
///
/// Parsers are cheap; the heavy state (the tables) lives in the shared
/// [`Language`](crate::Language). One parser handles one request at a time;
/// create more for concurrent parsing of different buffers.
pub struct Parser {
    language: LanguageRef,
    options: ParseOptions,
}

impl Parser {
    #[must_use]
    pub fn new(language: LanguageRef) -> Self {
        Self {
            language,
            options: ParseOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(language: LanguageRef, options: ParseOptions) -> Self {
        Self { language, options }
    }

    #[must_use]
    pub const fn language(&self) -> &LanguageRef {
        &self.language
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    /// Parse `text`, reusing subtrees of `old_tree` where its recorded edits
    /// allow.
    ///
    /// With an old tree and no recorded edits the old tree is returned as
    /// is: reparsing unchanged input is the identity. Without an old tree
    /// this is a plain from-scratch parse.
    pub fn parse(&mut self, text: &str, old_tree: Option<&SyntaxTree>) -> SyntaxTree {
        let _guard = tracing::debug_span!("parse", bytes = text.len()).entered();

        if let Some(old) = old_tree {
            if old.edits().is_empty() && old.text_len().as_usize() == text.len() {
                debug!("no edits recorded; returning previous tree");
                return old.clone();
            }
        }

        let reuse = old_tree.and_then(ReuseSource::new);
        let reused = reuse.is_some();
        let outcome = self.run(text, reuse);

        let (root, status, lex_errors) = match outcome {
            RunOutcome::Tree {
                root,
                status,
                lex_errors,
            } => (root, status, lex_errors),
            RunOutcome::Mismatch => {
                debug!("reuse mismatch; reparsing from scratch");
                match self.run(text, None) {
                    RunOutcome::Tree {
                        root,
                        status,
                        lex_errors,
                    } => (root, status, lex_errors),
                    // Unreachable without a reuse source; keep the request
                    // total anyway.
                    RunOutcome::Mismatch => (
                        GreenNode::new(
                            self.language.parse_table().start_symbol(),
                            Vec::new(),
                            StateId::START,
                        ),
                        ParseStatus::ErrorsPresent,
                        Vec::new(),
                    ),
                }
            }
        };

        if reused {
            debug!(len = %root.text_len(), "incremental parse finished");
        }
        SyntaxTree::new(
            root,
            Arc::clone(&self.language),
            LineIndex::new(text),
            status,
            lex_errors,
        )
    }

    fn run(&self, text: &str, reuse: Option<ReuseSource<'_>>) -> RunOutcome {
        Runner::new(
            &self.language,
            text,
            self.options.fork,
            self.options.budget.tracker(),
            self.options.recovery_lookahead,
            reuse,
        )
        .run()
    }
}
