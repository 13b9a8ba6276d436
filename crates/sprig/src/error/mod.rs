//! Error types for the engine.
//!
//! Per-token and per-state failures are never surfaced as `Err`: they are
//! absorbed into the tree as error nodes so a tree is always produced. The
//! only hard failure is a grammar table that does not validate, which rejects
//! the parse request before any tokens are consumed.

use crate::language::{ProductionId, StateId, SymbolId};
use crate::syntax::TextRange;
use thiserror::Error;

/// Load-time validation failures of a supplied language descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("start symbol {0:?} is not in the symbol table")]
    MissingStartSymbol(SymbolId),

    #[error("start symbol {0:?} is not a non-terminal")]
    StartSymbolNotNonTerminal(SymbolId),

    #[error("symbol table has no end-of-input terminal at index 0")]
    MissingEndSymbol,

    #[error("parse table has no states")]
    EmptyParseTable,

    #[error("production {production:?} references symbol {symbol:?} outside the symbol table")]
    DanglingProduction {
        production: ProductionId,
        symbol: SymbolId,
    },

    #[error("state {state:?} action on {lookahead:?} targets invalid state {target:?}")]
    InvalidShiftTarget {
        state: StateId,
        lookahead: SymbolId,
        target: StateId,
    },

    #[error("state {state:?} action on {lookahead:?} references invalid production {production:?}")]
    InvalidReduceTarget {
        state: StateId,
        lookahead: SymbolId,
        production: ProductionId,
    },

    #[error("state {state:?} goto on {symbol:?} targets invalid state {target:?}")]
    InvalidGotoTarget {
        state: StateId,
        symbol: SymbolId,
        target: StateId,
    },

    #[error("action or goto on symbol {symbol:?} is outside the symbol table")]
    SymbolOutOfRange { symbol: SymbolId },

    #[error("epsilon productions form a reduction cycle at state {state:?} on {lookahead:?}")]
    EpsilonCycle {
        state: StateId,
        lookahead: SymbolId,
    },

    #[error("lex state {state} transition targets invalid state {target}")]
    InvalidLexTarget { state: u32, target: u32 },

    #[error("lex state {state} accepts non-terminal symbol {symbol:?}")]
    LexAcceptsNonTerminal { state: u32, symbol: SymbolId },
}

/// Outcome classification of a parse request.
///
/// A tree is returned in every case; the status tells the caller how much to
/// trust it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ParseStatus {
    /// The whole buffer parsed without error nodes.
    #[default]
    Ok,
    /// The tree contains one or more error or missing nodes.
    ErrorsPresent,
    /// The operation budget ran out; the tree is partial but still tiles the
    /// buffer.
    TimedOut,
}

impl ParseStatus {
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Reason a lex attempt produced a synthetic invalid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("no token rule matches at this position")]
    NoRuleMatches,
}

/// A recorded lexical fault. Non-fatal: the scanner emits a one-character
/// invalid token and the automaton recovers around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at {span}")]
pub struct LexError {
    pub span: TextRange,
    pub kind: LexErrorKind,
}
