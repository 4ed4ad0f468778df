//! Concurrency limit enforcement for a single scheduler instance.
//!
//! The gate is only touched while the owning scheduler's state lock is held,
//! so it is a plain counter rather than an atomic guard.

/// Counts executing requests against a fixed limit.
///
/// A limit of zero means no slot limit; the scheduler is then gated by
/// something else (the speculative byte budget).
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    limit: usize,
    in_flight: usize,
    peak: usize,
}

impl ConcurrencyGate {
    pub fn new(limit: usize) -> Self {
        Self { limit, in_flight: 0, peak: 0 }
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit == 0
    }

    pub fn has_capacity(&self) -> bool {
        self.is_unbounded() || self.in_flight < self.limit
    }

    /// Reserve a slot. Returns false when the limit is reached.
    pub fn try_acquire(&mut self) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.in_flight += 1;
        self.peak = self.peak.max(self.in_flight);
        true
    }

    pub fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Release every slot at once. Returns how many were held.
    pub fn release_all(&mut self) -> usize {
        std::mem::take(&mut self.in_flight)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Highest in-flight count observed since construction.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Free slots, or `None` when unbounded.
    pub fn available(&self) -> Option<usize> {
        (!self.is_unbounded()).then(|| self.limit.saturating_sub(self.in_flight))
    }
}
