//! Bounded forking for declared grammar conflicts.
//!
//! A parse state that carries more than one action for a lookahead is a
//! declared conflict: the automaton forks, runs the alternatives in
//! lockstep over the shared token stream, and converges back to one stack.
//! Forking is bounded both in width (live stacks) and in lifetime (tokens a
//! fork may survive without converging); past either bound the configured
//! tie-break picks a survivor so parse cost stays linear.

/// Which fork survives when alternatives must be pruned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForkTieBreak {
    /// Highest accumulated production precedence wins.
    #[default]
    HigherPrecedence,
    /// The fork created from the earliest-declared action wins.
    FirstDeclared,
}

/// Limits and tie-break for conflict forking.
#[derive(Debug, Clone, Copy)]
pub struct ForkPolicy {
    /// Most stacks alive at once. `1` disables forking entirely; the
    /// first-declared action is taken at every conflict.
    pub max_forks: usize,
    /// Tokens a fork may survive before pruning forces convergence.
    pub window_tokens: u32,
    pub tie_break: ForkTieBreak,
}

impl Default for ForkPolicy {
    fn default() -> Self {
        Self {
            max_forks: 4,
            window_tokens: 64,
            tie_break: ForkTieBreak::default(),
        }
    }
}

impl ForkPolicy {
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_forks: 1,
            window_tokens: 0,
            tie_break: ForkTieBreak::FirstDeclared,
        }
    }
}
