//! Grow-only Counter (G-Counter) CRDT
//!
//! Each agent owns one slot and only ever grows it. The counter's value is the
//! sum of all slots; merge takes the per-slot maximum.

use crate::{traits::Mergeable, types::AgentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grow-only counter state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GCounter {
    counts: BTreeMap<AgentId, u64>,
}

impl GCounter {
    /// Create new empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the slot of `agent`
    pub fn increment(&mut self, agent: &AgentId, amount: u64) {
        if amount == 0 {
            return;
        }
        let slot = self.counts.entry(agent.clone()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Total across all agent slots
    pub fn value(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, n| acc.saturating_add(*n))
    }

    /// Slot value of a single agent
    pub fn agent_value(&self, agent: &AgentId) -> u64 {
        self.counts.get(agent).copied().unwrap_or(0)
    }

    /// Agents with a non-zero slot
    pub fn agents(&self) -> impl Iterator<Item = &AgentId> {
        self.counts.keys()
    }
}

impl Mergeable for GCounter {
    fn merge(&self, other: &Self) -> Self {
        let mut counts = self.counts.clone();
        for (agent, &theirs) in &other.counts {
            let slot = counts.entry(agent.clone()).or_insert(0);
            *slot = (*slot).max(theirs);
        }
        Self { counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_sums_every_slot() {
        let mut counter = GCounter::new();
        for agent in ["a1", "a2", "a3"] {
            for _ in 0..3 {
                counter.increment(&AgentId::new(agent), 1);
            }
        }
        assert_eq!(counter.value(), 9);
        assert_eq!(counter.agent_value(&AgentId::new("a2")), 3);
    }

    #[test]
    fn test_merge_takes_slot_max() {
        let a1 = AgentId::new("a1");
        let a2 = AgentId::new("a2");

        let mut left = GCounter::new();
        for _ in 0..3 {
            left.increment(&a1, 1);
        }
        let mut right = GCounter::new();
        right.increment(&a2, 5);
        right.increment(&a1, 1);

        let merged = left.merge(&right);
        assert_eq!(merged.value(), 8);
        assert_eq!(merged, right.merge(&left));
        assert_eq!(merged.merge(&merged), merged);
    }

    #[test]
    fn test_zero_increment_is_noop() {
        let mut counter = GCounter::new();
        counter.increment(&AgentId::new("a1"), 0);
        assert_eq!(counter, GCounter::new());
    }
}
