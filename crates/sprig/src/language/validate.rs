//! Load-time validation of supplied grammar tables.
//!
//! Runs once in [`Language::new`](crate::language::Language::new); a table
//! that fails here is rejected before any tokens are consumed.

use crate::error::LanguageError;
use crate::language::{
    LexTable, ParseAction, ParseTable, StateId, SymbolId, SymbolInfo, SymbolKind,
};
use hashbrown::HashSet;

pub(crate) fn validate(
    symbols: &[SymbolInfo],
    lex: &LexTable,
    parse: &ParseTable,
) -> Result<(), LanguageError> {
    if symbols.is_empty() || symbols[0].kind != SymbolKind::Terminal {
        return Err(LanguageError::MissingEndSymbol);
    }
    if parse.state_count() == 0 {
        return Err(LanguageError::EmptyParseTable);
    }

    let start = parse.start_symbol();
    match symbols.get(start.index()) {
        None => return Err(LanguageError::MissingStartSymbol(start)),
        Some(info) if info.kind != SymbolKind::NonTerminal => {
            return Err(LanguageError::StartSymbolNotNonTerminal(start));
        }
        Some(_) => {}
    }

    let in_range = |symbol: SymbolId| symbol.index() < symbols.len();

    for idx in 0..parse.production_count() {
        let id = crate::language::ProductionId(u16::try_from(idx).unwrap_or(u16::MAX));
        let production = parse.production(id);
        let lhs_ok = in_range(production.lhs)
            && symbols[production.lhs.index()].kind == SymbolKind::NonTerminal;
        if !lhs_ok {
            return Err(LanguageError::DanglingProduction {
                production: id,
                symbol: production.lhs,
            });
        }
    }

    for (state_idx, state) in parse.states().iter().enumerate() {
        let state_id = StateId(u32::try_from(state_idx).unwrap_or(u32::MAX));

        for (lookahead, actions) in state.action_entries() {
            if !in_range(lookahead) {
                return Err(LanguageError::SymbolOutOfRange { symbol: lookahead });
            }
            for action in actions {
                match *action {
                    ParseAction::Shift(target) => {
                        if parse.try_state(target).is_none() {
                            return Err(LanguageError::InvalidShiftTarget {
                                state: state_id,
                                lookahead,
                                target,
                            });
                        }
                    }
                    ParseAction::Reduce(production) => {
                        if parse.try_production(production).is_none() {
                            return Err(LanguageError::InvalidReduceTarget {
                                state: state_id,
                                lookahead,
                                production,
                            });
                        }
                    }
                    ParseAction::Accept => {}
                }
            }
        }

        for (symbol, target) in state.goto_entries() {
            if !in_range(symbol) {
                return Err(LanguageError::SymbolOutOfRange { symbol });
            }
            if parse.try_state(target).is_none() {
                return Err(LanguageError::InvalidGotoTarget {
                    state: state_id,
                    symbol,
                    target,
                });
            }
        }
    }

    check_epsilon_cycles(parse)?;
    validate_lex(symbols, lex)?;
    Ok(())
}

/// Reject tables where chains of zero-length reductions can revisit a state
/// without consuming input; at runtime such a chain would loop forever.
fn check_epsilon_cycles(parse: &ParseTable) -> Result<(), LanguageError> {
    for (state_idx, state) in parse.states().iter().enumerate() {
        let origin = StateId(u32::try_from(state_idx).unwrap_or(u32::MAX));
        for (lookahead, actions) in state.action_entries() {
            let Some(ParseAction::Reduce(first)) = actions.first().copied() else {
                continue;
            };
            if parse.production(first).len != 0 {
                continue;
            }

            let mut visited: HashSet<StateId, ahash::RandomState> = HashSet::default();
            visited.insert(origin);
            let mut current = origin;
            loop {
                let Some(ParseAction::Reduce(id)) =
                    parse.state(current).actions(lookahead).first().copied()
                else {
                    break;
                };
                let production = parse.production(id);
                if production.len != 0 {
                    break;
                }
                let Some(next) = parse.state(current).goto(production.lhs) else {
                    break;
                };
                if !visited.insert(next) {
                    return Err(LanguageError::EpsilonCycle {
                        state: origin,
                        lookahead,
                    });
                }
                current = next;
            }
        }
    }
    Ok(())
}

fn validate_lex(symbols: &[SymbolInfo], lex: &LexTable) -> Result<(), LanguageError> {
    let state_count = u32::try_from(lex.state_count()).unwrap_or(u32::MAX);
    for (idx, state) in lex.states().iter().enumerate() {
        let id = u32::try_from(idx).unwrap_or(u32::MAX);
        for (_, _, target) in state.transitions() {
            if *target >= state_count {
                return Err(LanguageError::InvalidLexTarget {
                    state: id,
                    target: *target,
                });
            }
        }
        if let Some(accept) = state.accept() {
            let kind = symbols.get(accept.symbol.index()).map(|info| info.kind);
            match kind {
                Some(SymbolKind::Terminal | SymbolKind::Trivia) => {}
                _ => {
                    return Err(LanguageError::LexAcceptsNonTerminal {
                        state: id,
                        symbol: accept.symbol,
                    });
                }
            }
        }
    }
    Ok(())
}
