//! Byte budget for speculative (prefetch) traffic.
//!
//! Costs are charged when a request is admitted, using its size estimate.
//! A request is only admitted if its whole cost fits, so the remaining
//! allowance never goes negative and in-flight work cannot overshoot it.

/// Remaining byte allowance, replaced wholesale by [`BudgetTracker::reset`].
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    remaining: u64,
    charged_total: u64,
    vetoes: u64,
    generation: u64,
}

impl BudgetTracker {
    pub fn new(initial_bytes: u64) -> Self {
        Self { remaining: initial_bytes, charged_total: 0, vetoes: 0, generation: 0 }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn covers(&self, cost: u64) -> bool {
        cost <= self.remaining
    }

    /// Charge `cost` if it fits; otherwise leave the allowance untouched.
    pub fn try_charge(&mut self, cost: u64) -> bool {
        if !self.covers(cost) {
            return false;
        }
        self.remaining -= cost;
        self.charged_total = self.charged_total.saturating_add(cost);
        true
    }

    /// Count requests refused admission. Callers count each request at most
    /// once per [`generation`](Self::generation).
    pub fn record_vetoes(&mut self, count: u64) {
        self.vetoes = self.vetoes.saturating_add(count);
    }

    /// Replace the remaining allowance and start a new generation.
    /// Returns the previous value.
    pub fn reset(&mut self, bytes: u64) -> u64 {
        self.generation += 1;
        std::mem::replace(&mut self.remaining, bytes)
    }

    /// Bumped by every [`reset`](Self::reset).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bytes charged since construction, across resets.
    pub fn charged_total(&self) -> u64 {
        self.charged_total
    }

    pub fn vetoes(&self) -> u64 {
        self.vetoes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_within_budget() {
        let mut budget = BudgetTracker::new(1000);
        assert!(budget.try_charge(400));
        assert!(budget.try_charge(600));
        assert_eq!(budget.remaining(), 0);
        assert_eq!(budget.charged_total(), 1000);
    }

    #[test]
    fn charge_beyond_budget_leaves_remaining() {
        let mut budget = BudgetTracker::new(100);
        assert!(!budget.try_charge(101));
        assert_eq!(budget.remaining(), 100);
        assert_eq!(budget.charged_total(), 0);
    }

    #[test]
    fn vetoes_accumulate_and_reset_starts_a_generation() {
        let mut budget = BudgetTracker::new(0);
        budget.record_vetoes(2);
        assert_eq!(budget.generation(), 0);
        budget.reset(10);
        budget.record_vetoes(1);
        assert_eq!(budget.generation(), 1);
        assert_eq!(budget.vetoes(), 3);
    }

    #[test]
    fn zero_cost_always_fits() {
        let mut budget = BudgetTracker::new(0);
        assert!(budget.try_charge(0));
        assert!(!budget.covers(1));
    }

    #[test]
    fn reset_replaces_rather_than_adds() {
        let mut budget = BudgetTracker::new(500);
        budget.try_charge(200);
        assert_eq!(budget.reset(100), 300);
        assert_eq!(budget.remaining(), 100);
        assert_eq!(budget.charged_total(), 200);
    }
}
