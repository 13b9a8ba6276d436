//! Operation budgets for long parses.

use std::time::{Duration, Instant};

/// Limits on how much work one parse request may do.
///
/// When either limit is hit the automaton stops consuming input and returns
/// a partial tree with [`ParseStatus::TimedOut`](crate::ParseStatus); the
/// tree still tiles the whole buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseBudget {
    max_steps: Option<u64>,
    deadline: Option<Instant>,
}

impl ParseBudget {
    /// No limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_steps: None,
            deadline: None,
        }
    }

    /// Cap the number of automaton steps (shifts, reductions, recovery
    /// probes).
    #[must_use]
    pub const fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Stop once the wall clock passes `now + limit`.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.deadline = Some(Instant::now() + limit);
        self
    }

    pub(crate) const fn tracker(self) -> BudgetTracker {
        BudgetTracker {
            budget: self,
            steps: 0,
        }
    }
}

/// Mutable per-parse counter over a [`ParseBudget`].
pub(crate) struct BudgetTracker {
    budget: ParseBudget,
    steps: u64,
}

/// How often the deadline clock is consulted.
const DEADLINE_CHECK_MASK: u64 = 0x3ff;

impl BudgetTracker {
    /// Account for one automaton step. Returns `false` once the budget is
    /// exhausted.
    pub(crate) fn spend(&mut self) -> bool {
        self.steps += 1;
        if let Some(max) = self.budget.max_steps {
            if self.steps > max {
                return false;
            }
        }
        if let Some(deadline) = self.budget.deadline {
            if self.steps & DEADLINE_CHECK_MASK == 0 && Instant::now() >= deadline {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_budget_never_trips() {
        let mut tracker = ParseBudget::unlimited().tracker();
        for _ in 0..10_000 {
            assert!(tracker.spend());
        }
    }

    #[test]
    fn step_cap_trips_after_the_limit() {
        let mut tracker = ParseBudget::unlimited().with_max_steps(3).tracker();
        assert!(tracker.spend());
        assert!(tracker.spend());
        assert!(tracker.spend());
        assert!(!tracker.spend());
    }

    #[test]
    fn expired_deadline_trips_on_check() {
        let budget = ParseBudget::unlimited().with_time_limit(Duration::ZERO);
        let mut tracker = budget.tracker();
        let mut tripped = false;
        for _ in 0..=DEADLINE_CHECK_MASK {
            if !tracker.spend() {
                tripped = true;
                break;
            }
        }
        assert!(tripped);
    }
}
