//! Multi-Value Register (MV-Register) CRDT
//!
//! Each agent writes into its own slot, stamped with the vector clock of the
//! write. Merge keeps the slots of both sides; when both sides hold entries for
//! the same agent, a dominated entry is dropped and concurrent ones are kept.
//! Readers see every value not causally superseded by another value.

use crate::{
    clock::VectorClock,
    traits::Mergeable,
    types::{AgentId, Payload},
};
use serde::{Deserialize, Serialize};

/// One agent's write together with its causal context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvEntry {
    pub agent: AgentId,
    pub value: Payload,
    pub clock: VectorClock,
}

impl MvEntry {
    fn sort_key(&self) -> (&AgentId, Vec<(&AgentId, u64)>, &Payload) {
        (&self.agent, self.clock.iter().collect(), &self.value)
    }
}

/// Multi-value register state
///
/// Entries are kept in canonical order so equal states compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvRegister {
    entries: Vec<MvEntry>,
}

impl MvRegister {
    /// Create a new empty MV-Register.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` into the slot of `agent` with causal context `clock`
    pub fn set(&mut self, agent: AgentId, value: Payload, clock: VectorClock) {
        let mut entries = std::mem::take(&mut self.entries);
        entries.push(MvEntry {
            agent,
            value,
            clock,
        });
        self.entries = normalize(entries);
    }

    /// Values not dominated by any other entry present
    pub fn concurrent_values(&self) -> Vec<&Payload> {
        self.entries
            .iter()
            .filter(|entry| {
                !self
                    .entries
                    .iter()
                    .any(|other| other.clock.dominates(&entry.clock))
            })
            .map(|entry| &entry.value)
            .collect()
    }

    /// Returns true if more than one value is currently visible.
    pub fn is_conflicted(&self) -> bool {
        self.concurrent_values().len() > 1
    }

    /// Returns true if the register has no values.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every stored entry, including causally superseded ones from other slots
    pub fn entries(&self) -> &[MvEntry] {
        &self.entries
    }
}

impl Mergeable for MvRegister {
    fn merge(&self, other: &Self) -> Self {
        let entries = self
            .entries
            .iter()
            .chain(other.entries.iter())
            .cloned()
            .collect();
        Self {
            entries: normalize(entries),
        }
    }
}

/// Drop entries dominated within their own agent slot, collapse exact
/// duplicates and sort canonically.
fn normalize(entries: Vec<MvEntry>) -> Vec<MvEntry> {
    let mut kept: Vec<MvEntry> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let superseded = entries.iter().enumerate().any(|(j, other)| {
            i != j && other.agent == entry.agent && other.clock.dominates(&entry.clock)
        });
        if superseded {
            continue;
        }
        // Same slot and clock: keep the greater payload so the choice is order-independent
        match kept
            .iter_mut()
            .find(|k| k.agent == entry.agent && k.clock == entry.clock)
        {
            Some(existing) => {
                if entry.value > existing.value {
                    existing.value = entry.value.clone();
                }
            }
            None => kept.push(entry.clone()),
        }
    }
    kept.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(entries: &[(&str, u64)]) -> VectorClock {
        entries.iter().map(|(agent, counter)| (*agent, *counter)).collect()
    }

    #[test]
    fn test_concurrent_writes_are_both_visible() {
        let mut left = MvRegister::new();
        left.set(AgentId::new("a1"), "x".into(), clock(&[("a1", 1)]));
        let mut right = MvRegister::new();
        right.set(AgentId::new("a2"), "y".into(), clock(&[("a2", 1)]));

        let merged = left.merge(&right);
        assert!(merged.is_conflicted());
        assert_eq!(merged.concurrent_values().len(), 2);
        assert_eq!(merged, right.merge(&left));
    }

    #[test]
    fn test_superseded_same_slot_value_disappears() {
        let a1 = AgentId::new("a1");
        let mut old = MvRegister::new();
        old.set(a1.clone(), "v1".into(), clock(&[("a1", 1)]));
        let mut new = old.clone();
        new.set(a1.clone(), "v2".into(), clock(&[("a1", 2)]));

        let merged = old.merge(&new);
        assert_eq!(merged.entries().len(), 1);
        assert_eq!(merged.concurrent_values(), vec![&Payload::from("v2")]);
    }

    #[test]
    fn test_causally_later_write_hides_other_slot() {
        let mut reg = MvRegister::new();
        reg.set(AgentId::new("a1"), "first".into(), clock(&[("a1", 1)]));
        // a2 saw a1's write before writing
        reg.set(AgentId::new("a2"), "second".into(), clock(&[("a1", 1), ("a2", 1)]));

        assert_eq!(reg.entries().len(), 2);
        assert_eq!(reg.concurrent_values(), vec![&Payload::from("second")]);
        assert!(!reg.is_conflicted());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut reg = MvRegister::new();
        reg.set(AgentId::new("a1"), "x".into(), clock(&[("a1", 1)]));
        reg.set(AgentId::new("a2"), "y".into(), clock(&[("a2", 3)]));
        assert_eq!(reg.merge(&reg), reg);
    }
}
