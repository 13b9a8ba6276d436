//! # Language descriptors
//!
//! A [`Language`] bundles everything the engine needs to parse one source
//! language: the symbol table, the static token automaton, the parse
//! automaton, and optional external scanners for context-sensitive tokens.
//! All of it is immutable, externally supplied data: the engine validates
//! and consumes tables, it never authors them.
//!
//! Descriptors are shared behind `Arc`: trees keep a handle to the language
//! they were parsed with, and many parsers may use one descriptor
//! concurrently.

mod external;
mod lex_table;
mod table;
mod validate;

pub use external::{ExternalScanner, ScannerFactory, ScannerSnapshot};
pub use lex_table::{LexAccept, LexState, LexTable};
pub use table::{
    ActionList, Associativity, ParseAction, ParseState, ParseTable, Production, ProductionId,
    StateId, SymbolId, SymbolInfo, SymbolKind, SymbolSet,
};

use crate::error::LanguageError;
use std::sync::Arc;

/// An opaque language descriptor.
pub struct Language {
    symbols: Vec<SymbolInfo>,
    lex: LexTable,
    parse: ParseTable,
    scanner: Option<ScannerFactory>,
}

impl Language {
    /// Validate the supplied tables and assemble a descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`LanguageError`] when the tables are structurally invalid:
    /// missing start or end symbol, dangling production or action targets,
    /// epsilon-reduction cycles, or lex transitions out of range. This is the
    /// only hard failure in the engine; it happens before any parse consumes
    /// a token.
    pub fn new(
        symbols: Vec<SymbolInfo>,
        lex: LexTable,
        parse: ParseTable,
    ) -> Result<Self, LanguageError> {
        validate::validate(&symbols, &lex, &parse)?;
        Ok(Self {
            symbols,
            lex,
            parse,
            scanner: None,
        })
    }

    /// Attach an external scanner factory.
    #[must_use]
    pub fn with_external_scanner(mut self, factory: ScannerFactory) -> Self {
        self.scanner = Some(factory);
        self
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(id.index())
    }

    /// Human-readable name for a symbol, including the synthetic error symbol.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> &str {
        if id.is_error() {
            return "ERROR";
        }
        self.symbol(id).map_or("?", |info| info.name.as_str())
    }

    #[must_use]
    pub fn symbol_kind(&self, id: SymbolId) -> Option<SymbolKind> {
        self.symbol(id).map(|info| info.kind)
    }

    #[must_use]
    pub fn is_trivia(&self, id: SymbolId) -> bool {
        self.symbol_kind(id) == Some(SymbolKind::Trivia)
    }

    #[must_use]
    pub fn is_terminal(&self, id: SymbolId) -> bool {
        matches!(
            self.symbol_kind(id),
            Some(SymbolKind::Terminal | SymbolKind::Trivia | SymbolKind::External)
        )
    }

    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub const fn parse_table(&self) -> &ParseTable {
        &self.parse
    }

    #[must_use]
    pub const fn lex_table(&self) -> &LexTable {
        &self.lex
    }

    #[must_use]
    pub const fn has_external_scanner(&self) -> bool {
        self.scanner.is_some()
    }

    /// Instantiate the external scanner in its initial state.
    #[must_use]
    pub fn create_external_scanner(&self) -> Option<Box<dyn ExternalScanner>> {
        self.scanner.as_ref().map(|factory| factory())
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("symbols", &self.symbols.len())
            .field("lex_states", &self.lex.state_count())
            .field("parse_states", &self.parse.state_count())
            .field("external_scanner", &self.scanner.is_some())
            .finish()
    }
}

/// Shared handle to a language descriptor.
pub type LanguageRef = Arc<Language>;
