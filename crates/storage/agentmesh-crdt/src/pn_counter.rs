//! PN-Counter (Increment/Decrement Counter) CRDT implementation
//!
//! PN-Counter allows both increment and decrement operations on a distributed counter.
//! It maintains separate P (positive) and N (negative) grow-only counters internally.

use crate::{g_counter::GCounter, traits::Mergeable, types::AgentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// PN-Counter state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnCounter {
    /// Increments per agent
    positive: GCounter,
    /// Decrements per agent
    negative: GCounter,
}

impl PnCounter {
    /// Create new empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter on behalf of `agent`
    pub fn increment(&mut self, agent: &AgentId, amount: u64) {
        self.positive.increment(agent, amount);
    }

    /// Decrement the counter on behalf of `agent`
    pub fn decrement(&mut self, agent: &AgentId, amount: u64) {
        self.negative.increment(agent, amount);
    }

    /// Get current counter value, saturating at the bounds of `i64`
    pub fn value(&self) -> i64 {
        difference(self.positive.value(), self.negative.value())
    }

    /// Get positive sum
    pub fn positive_sum(&self) -> u64 {
        self.positive.value()
    }

    /// Get negative sum
    pub fn negative_sum(&self) -> u64 {
        self.negative.value()
    }

    /// Get contribution of a specific agent to the counter
    pub fn agent_contribution(&self, agent: &AgentId) -> i64 {
        difference(self.positive.agent_value(agent), self.negative.agent_value(agent))
    }

    /// Get all agents that have contributed to this counter
    pub fn contributing_agents(&self) -> BTreeSet<AgentId> {
        self.positive
            .agents()
            .chain(self.negative.agents())
            .cloned()
            .collect()
    }
}

impl Mergeable for PnCounter {
    fn merge(&self, other: &Self) -> Self {
        Self {
            positive: self.positive.merge(&other.positive),
            negative: self.negative.merge(&other.negative),
        }
    }
}

fn difference(positive: u64, negative: u64) -> i64 {
    let exact = i128::from(positive) - i128::from(negative);
    exact.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pn_counter_increment() {
        let agent = AgentId::new("a1");
        let mut counter = PnCounter::new();

        counter.increment(&agent, 5);
        counter.increment(&agent, 3);

        assert_eq!(counter.value(), 8);
        assert_eq!(counter.positive_sum(), 8);
        assert_eq!(counter.negative_sum(), 0);
    }

    #[test]
    fn test_pn_counter_decrement() {
        let agent = AgentId::new("a1");
        let mut counter = PnCounter::new();

        counter.increment(&agent, 10);
        counter.decrement(&agent, 3);

        assert_eq!(counter.value(), 7);
        assert_eq!(counter.positive_sum(), 10);
        assert_eq!(counter.negative_sum(), 3);
    }

    #[test]
    fn test_pn_counter_merge() {
        let a1 = AgentId::new("a1");
        let a2 = AgentId::new("a2");

        let mut counter1 = PnCounter::new();
        let mut counter2 = PnCounter::new();

        counter1.increment(&a1, 10);
        counter2.decrement(&a2, 3);

        let merged = counter1.merge(&counter2);
        assert_eq!(merged.value(), 7);
        assert_eq!(merged, counter2.merge(&counter1));
    }

    #[test]
    fn test_pn_counter_agent_contribution() {
        let a1 = AgentId::new("a1");
        let a2 = AgentId::new("a2");
        let mut counter = PnCounter::new();

        counter.increment(&a1, 10);
        counter.decrement(&a1, 3);
        counter.increment(&a2, 5);

        assert_eq!(counter.agent_contribution(&a1), 7);
        assert_eq!(counter.agent_contribution(&a2), 5);
        assert_eq!(counter.value(), 12);
        assert_eq!(counter.contributing_agents().len(), 2);
    }

    #[test]
    fn test_pn_counter_saturates_at_bounds() {
        let agent = AgentId::new("a1");
        let mut counter = PnCounter::new();

        counter.decrement(&agent, i64::MAX as u64);
        counter.decrement(&agent, 1);
        counter.increment(&agent, 1);
        assert_eq!(counter.value(), -i64::MAX);

        counter.decrement(&agent, u64::MAX);
        assert_eq!(counter.value(), i64::MIN);
        assert_eq!(counter.agent_contribution(&agent), i64::MIN);

        let mut positive = PnCounter::new();
        positive.increment(&agent, u64::MAX);
        assert_eq!(positive.value(), i64::MAX);
    }
}
