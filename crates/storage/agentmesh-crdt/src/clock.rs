//! Vector clocks for causal ordering
//!
//! Every replica and every operation carries a [`VectorClock`]. Clocks are
//! values: attaching one to an operation or CRDT is a clone, so later local
//! increments never alter history that was already emitted.

use crate::types::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Per-agent logical counter vector
///
/// Zero slots are never stored, so a missing slot and a zero slot compare and
/// serialize identically. On the wire the clock is a plain agent→counter map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<AgentId, u64>", into = "BTreeMap<AgentId, u64>")]
pub struct VectorClock {
    clocks: BTreeMap<AgentId, u64>,
}

/// Causal relationship between two clocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockOrdering {
    Before,
    After,
    Equal,
    Concurrent,
}

impl ClockOrdering {
    /// The same relationship seen from the other side
    pub fn reverse(self) -> Self {
        match self {
            ClockOrdering::Before => ClockOrdering::After,
            ClockOrdering::After => ClockOrdering::Before,
            other => other,
        }
    }
}

impl VectorClock {
    /// Create new vector clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the slot of `agent`. Only the owning agent may call this for its own id.
    pub fn increment(&mut self, agent: &AgentId) -> u64 {
        let counter = self.clocks.entry(agent.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Get clock value for an agent
    pub fn get(&self, agent: &AgentId) -> u64 {
        self.clocks.get(agent).copied().unwrap_or(0)
    }

    /// Set clock value for an agent
    pub fn set(&mut self, agent: AgentId, value: u64) {
        if value == 0 {
            self.clocks.remove(&agent);
        } else {
            self.clocks.insert(agent, value);
        }
    }

    /// Merge another clock into this one (pointwise maximum)
    pub fn merge(&mut self, other: &VectorClock) {
        for (agent, &counter) in &other.clocks {
            let current = self.clocks.entry(agent.clone()).or_insert(0);
            *current = (*current).max(counter);
        }
    }

    /// Pointwise maximum of two clocks as a new clock
    pub fn merged(&self, other: &VectorClock) -> VectorClock {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Independent snapshot of this clock
    pub fn copy(&self) -> VectorClock {
        self.clone()
    }

    /// Compare with another vector clock
    pub fn compare(&self, other: &VectorClock) -> ClockOrdering {
        let mut less = false;
        let mut greater = false;

        for agent in self.clocks.keys().chain(other.clocks.keys()) {
            let mine = self.get(agent);
            let theirs = other.get(agent);
            if mine < theirs {
                less = true;
            } else if mine > theirs {
                greater = true;
            }
            if less && greater {
                return ClockOrdering::Concurrent;
            }
        }

        match (less, greater) {
            (false, false) => ClockOrdering::Equal,
            (true, false) => ClockOrdering::Before,
            (false, true) => ClockOrdering::After,
            (true, true) => ClockOrdering::Concurrent,
        }
    }

    /// Strictly more history than `other`
    pub fn dominates(&self, other: &VectorClock) -> bool {
        self.compare(other) == ClockOrdering::After
    }

    /// Every slot is `<=` the matching slot of `other`
    pub fn is_covered_by(&self, other: &VectorClock) -> bool {
        matches!(self.compare(other), ClockOrdering::Before | ClockOrdering::Equal)
    }

    /// Check if clocks are concurrent
    pub fn is_concurrent(&self, other: &VectorClock) -> bool {
        self.compare(other) == ClockOrdering::Concurrent
    }

    /// True when no agent has ticked
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Sum of all slots
    pub fn total(&self) -> u64 {
        self.clocks.values().sum()
    }

    /// Iterate over non-zero slots in agent order
    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, u64)> {
        self.clocks.iter().map(|(agent, &counter)| (agent, counter))
    }

    /// Get all agents in this vector clock
    pub fn agents(&self) -> impl Iterator<Item = &AgentId> {
        self.clocks.keys()
    }
}

impl From<BTreeMap<AgentId, u64>> for VectorClock {
    fn from(mut clocks: BTreeMap<AgentId, u64>) -> Self {
        clocks.retain(|_, counter| *counter > 0);
        Self { clocks }
    }
}

impl From<VectorClock> for BTreeMap<AgentId, u64> {
    fn from(clock: VectorClock) -> Self {
        clock.clocks
    }
}

impl<A: Into<AgentId>> FromIterator<(A, u64)> for VectorClock {
    fn from_iter<I: IntoIterator<Item = (A, u64)>>(iter: I) -> Self {
        let clocks: BTreeMap<AgentId, u64> =
            iter.into_iter().map(|(agent, counter)| (agent.into(), counter)).collect();
        clocks.into()
    }
}

impl Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (agent, counter)) in self.clocks.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", agent, counter)?;
        }
        f.write_str("}")
    }
}

/// Check whether an operation stamped with `operation_clock` by `origin` can be
/// delivered on top of `local_clock`
///
/// The operation must be the next event of its origin, and every event it
/// depends on from other agents must already be present locally.
pub fn is_causally_ready(
    operation_clock: &VectorClock,
    local_clock: &VectorClock,
    origin: &AgentId,
) -> bool {
    if operation_clock.get(origin) != local_clock.get(origin) + 1 {
        return false;
    }
    operation_clock
        .iter()
        .filter(|(agent, _)| *agent != origin)
        .all(|(agent, counter)| counter <= local_clock.get(agent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(entries: &[(&str, u64)]) -> VectorClock {
        entries.iter().map(|(agent, counter)| (*agent, *counter)).collect()
    }

    #[test]
    fn test_increment_only_touches_own_slot() {
        let a1 = AgentId::new("a1");
        let mut vc = clock(&[("a2", 4)]);
        assert_eq!(vc.increment(&a1), 1);
        assert_eq!(vc.increment(&a1), 2);
        assert_eq!(vc.get(&a1), 2);
        assert_eq!(vc.get(&AgentId::new("a2")), 4);
    }

    #[test]
    fn test_compare_after_and_concurrent() {
        let base = clock(&[("a1", 2), ("a2", 1)]);
        assert_eq!(base.compare(&clock(&[("a1", 2), ("a2", 0)])), ClockOrdering::After);
        assert_eq!(base.compare(&clock(&[("a1", 1), ("a2", 2)])), ClockOrdering::Concurrent);
        assert_eq!(base.compare(&base.copy()), ClockOrdering::Equal);
        assert_eq!(clock(&[("a1", 1)]).compare(&base), ClockOrdering::Before);
    }

    #[test]
    fn test_merge_is_pointwise_max() {
        let left = clock(&[("a1", 3), ("a2", 1)]);
        let right = clock(&[("a2", 5), ("a3", 2)]);
        let merged = left.merged(&right);

        assert_eq!(merged, clock(&[("a1", 3), ("a2", 5), ("a3", 2)]));
        // inputs untouched
        assert_eq!(left, clock(&[("a1", 3), ("a2", 1)]));
    }

    #[test]
    fn test_zero_slots_equal_missing_slots() {
        let explicit = clock(&[("a1", 2), ("a2", 0)]);
        assert_eq!(explicit, clock(&[("a1", 2)]));

        let json = serde_json::to_string(&explicit).unwrap();
        assert_eq!(json, r#"{"a1":2}"#);

        let parsed: VectorClock = serde_json::from_str(r#"{"a1":2,"a9":0}"#).unwrap();
        assert_eq!(parsed, explicit);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let agent = AgentId::new("a1");
        let mut live = VectorClock::new();
        live.increment(&agent);
        let snapshot = live.copy();
        live.increment(&agent);

        assert_eq!(snapshot.get(&agent), 1);
        assert_eq!(live.get(&agent), 2);
    }

    #[test]
    fn test_causal_readiness() {
        let origin = AgentId::new("a1");
        let local = clock(&[("a1", 1), ("a2", 3)]);

        assert!(is_causally_ready(&clock(&[("a1", 2), ("a2", 3)]), &local, &origin));
        // gap in the origin's own history
        assert!(!is_causally_ready(&clock(&[("a1", 3)]), &local, &origin));
        // depends on an a2 event we have not seen
        assert!(!is_causally_ready(&clock(&[("a1", 2), ("a2", 4)]), &local, &origin));
        // already delivered
        assert!(!is_causally_ready(&clock(&[("a1", 1)]), &local, &origin));
    }
}
