//! Request prioritization.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Priority tier for scheduled requests. Higher value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Speculative = 0,
    Background = 1,
    UserInitiated = 2,
}

impl Priority {
    /// All tiers, highest first.
    pub const DESCENDING: [Priority; 3] =
        [Priority::UserInitiated, Priority::Background, Priority::Speculative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Speculative => "speculative",
            Self::Background => "background",
            Self::UserInitiated => "user_initiated",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Background
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Speculative,
            1 => Self::Background,
            _ => Self::UserInitiated,
        }
    }
}

/// Tiered FIFO queue: strict priority across tiers, arrival order within one.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    tiers: [VecDeque<T>; 3],
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self { tiers: [VecDeque::new(), VecDeque::new(), VecDeque::new()] }
    }

    pub fn push(&mut self, item: T, priority: Priority) {
        self.tiers[priority.index()].push_back(item);
    }

    /// Remove the oldest item of the highest non-empty tier.
    pub fn pop(&mut self) -> Option<T> {
        self.pop_first_where(|_| true).map(|(_, item)| item)
    }

    /// Remove the first item, scanning tiers highest first and each tier
    /// oldest first, that satisfies `eligible`. Skipped items keep their
    /// place; `eligible` may annotate them in place.
    pub fn pop_first_where<F>(&mut self, mut eligible: F) -> Option<(Priority, T)>
    where
        F: FnMut(&mut T) -> bool,
    {
        for priority in Priority::DESCENDING {
            let tier = &mut self.tiers[priority.index()];
            if let Some(pos) = tier.iter_mut().position(&mut eligible) {
                return tier.remove(pos).map(|item| (priority, item));
            }
        }
        None
    }

    pub fn peek(&self) -> Option<&T> {
        Priority::DESCENDING
            .iter()
            .find_map(|p| self.tiers[p.index()].front())
    }

    /// Remove every item, highest tier first.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        for priority in Priority::DESCENDING {
            out.extend(self.tiers[priority.index()].drain(..));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(VecDeque::len).sum()
    }

    pub fn len_of(&self, priority: Priority) -> usize {
        self.tiers[priority.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(VecDeque::is_empty)
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(Priority::UserInitiated > Priority::Background);
        assert!(Priority::Background > Priority::Speculative);
        assert_eq!(Priority::from(7), Priority::UserInitiated);
    }

    #[test]
    fn higher_tier_pops_first_fifo_within_tier() {
        let mut q = PriorityQueue::new();
        q.push("r1", Priority::UserInitiated);
        q.push("r2", Priority::Background);
        q.push("r3", Priority::UserInitiated);
        q.push("r4", Priority::Speculative);

        let order: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(order, vec!["r1", "r3", "r2", "r4"]);
        assert!(q.is_empty());
    }

    #[test]
    fn skipped_items_keep_position() {
        let mut q = PriorityQueue::new();
        q.push(300u64, Priority::Speculative);
        q.push(50, Priority::Speculative);
        q.push(80, Priority::Speculative);

        let taken = q.pop_first_where(|cost| *cost <= 100);
        assert_eq!(taken, Some((Priority::Speculative, 50)));

        // 300 is still at the front of its tier.
        assert_eq!(q.peek(), Some(&300));
        assert_eq!(q.pop_first_where(|cost| *cost <= 100), Some((Priority::Speculative, 80)));
        assert_eq!(q.pop_first_where(|cost| *cost <= 100), None);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn drain_empties_every_tier() {
        let mut q = PriorityQueue::new();
        q.push(1, Priority::Speculative);
        q.push(2, Priority::UserInitiated);
        q.push(3, Priority::Background);
        assert_eq!(q.len_of(Priority::Background), 1);

        assert_eq!(q.drain(), vec![2, 3, 1]);
        assert_eq!(q.len(), 0);
        assert!(q.peek().is_none());
    }
}
