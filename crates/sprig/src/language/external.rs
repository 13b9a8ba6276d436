//! External scanners: pluggable, stateful lexing for context-sensitive tokens.
//!
//! Some lexical classes cannot be expressed in a static token automaton: a
//! token whose validity depends on nesting depth, or on distinguishing an
//! operator from the start of a new construct. Languages provide these as
//! external scanners: a closed five-operation interface (create, scan,
//! serialize, deserialize, destroy) rather than open-ended polymorphism, so
//! scanners stay data-driven and swappable per grammar.
//!
//! Determinism contract: `scan` must be a pure function of the buffer
//! position and the scanner's serialized state. Incremental reparsing saves
//! and restores that state at token boundaries; a scanner that consults
//! anything else will break the incremental/full-parse equivalence law.

use crate::language::{SymbolId, SymbolSet};
use crate::lexer::ScanCursor;
use std::sync::Arc;

/// A context-sensitive lexer extension.
///
/// Created per parse via [`ScannerFactory`]; dropped when the parse ends
/// (destroy). State round-trips through `serialize`/`deserialize` so it
/// survives incremental reparsing.
pub trait ExternalScanner: Send {
    /// Attempt to scan one token at the cursor position.
    ///
    /// `valid` is the set of external token symbols the current parse state
    /// accepts. On success the scanner must have advanced the cursor and
    /// called [`ScanCursor::mark_end`]; the returned symbol must be in
    /// `valid`. Returning `None` leaves token recognition to the static
    /// automaton.
    fn scan(&mut self, cursor: &mut ScanCursor<'_>, valid: &SymbolSet) -> Option<SymbolId>;

    /// Snapshot the scanner state. Called at token boundaries.
    fn serialize(&self) -> Vec<u8>;

    /// Restore a state produced by [`ExternalScanner::serialize`].
    fn deserialize(&mut self, bytes: &[u8]);
}

/// Creates a fresh scanner in its initial state.
pub type ScannerFactory = Arc<dyn Fn() -> Box<dyn ExternalScanner> + Send + Sync>;

/// Serialized external-scanner states recorded on a green node, used by the
/// reconciler to decide whether the node can be reused after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerSnapshot {
    /// State before the node's first token was scanned.
    pub at_start: Box<[u8]>,
    /// State after the node's last token was scanned.
    pub at_end: Box<[u8]>,
}
