//! Last-Writer-Wins Register CRDT implementation
//!
//! LWW-Register stores a single value with timestamp-based conflict resolution.
//! The most recent write wins; equal timestamps are resolved by the writer's
//! agent id, so both merge directions pick the same winner. Writes by one
//! agent within the same millisecond are ordered by the writer's counter.

use crate::{
    traits::Mergeable,
    types::{AgentId, Payload, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single write to the register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwEntry {
    pub value: Payload,
    pub timestamp: Timestamp,
    pub writer: AgentId,
    /// Writer's logical counter at the time of the write
    pub counter: u64,
}

impl LwwEntry {
    /// Total order used to pick the winner of two writes
    fn precedence(&self, other: &LwwEntry) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.writer.cmp(&other.writer))
            .then_with(|| self.counter.cmp(&other.counter))
            .then_with(|| self.value.cmp(&other.value))
    }
}

/// LWW Register state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwRegister {
    entry: Option<LwwEntry>,
}

impl LwwRegister {
    /// Create new empty register
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a write; it is kept only if it beats the current entry
    ///
    /// Returns whether the write became the current value.
    pub fn set(
        &mut self,
        value: Payload,
        timestamp: Timestamp,
        writer: AgentId,
        counter: u64,
    ) -> bool {
        let candidate = LwwEntry {
            value,
            timestamp,
            writer,
            counter,
        };
        match &self.entry {
            Some(current) if candidate.precedence(current) != Ordering::Greater => false,
            _ => {
                self.entry = Some(candidate);
                true
            }
        }
    }

    /// Get current value
    pub fn get(&self) -> Option<&Payload> {
        self.entry.as_ref().map(|entry| &entry.value)
    }

    /// Current winning write
    pub fn entry(&self) -> Option<&LwwEntry> {
        self.entry.as_ref()
    }

    /// Check if register is empty
    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Get last write timestamp
    pub fn last_write_timestamp(&self) -> Option<Timestamp> {
        self.entry.as_ref().map(|entry| entry.timestamp)
    }

    /// Get last writer
    pub fn last_writer(&self) -> Option<&AgentId> {
        self.entry.as_ref().map(|entry| &entry.writer)
    }
}

impl Mergeable for LwwRegister {
    fn merge(&self, other: &Self) -> Self {
        let entry = match (&self.entry, &other.entry) {
            (Some(mine), Some(theirs)) => {
                if theirs.precedence(mine) == Ordering::Greater {
                    Some(theirs.clone())
                } else {
                    Some(mine.clone())
                }
            }
            (Some(entry), None) | (None, Some(entry)) => Some(entry.clone()),
            (None, None) => None,
        };
        Self { entry }
    }
}
