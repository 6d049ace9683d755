//! Observed-Remove Set (OR-Set) CRDT implementation
//!
//! OR-Set provides conflict-free set operations where elements can be added and removed.
//! Every add is tagged with a unique [`Dot`]. A remove tombstones only the tags
//! the remover had observed, so an add concurrent with a remove survives it.

use crate::{
    error::{CrdtError, Result},
    traits::Mergeable,
    types::{Dot, Payload},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// OR-Set state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrSet {
    /// Every add tag ever observed, per element
    added: BTreeMap<Payload, BTreeSet<Dot>>,
    /// Removed tags, shared by all elements
    tombstones: BTreeSet<Dot>,
}

impl OrSet {
    /// Create new empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an add of `element` under a fresh tag
    ///
    /// A tag that is already tombstoned is recorded but stays dead.
    pub fn add(&mut self, element: Payload, tag: Dot) {
        self.added.entry(element).or_default().insert(tag);
    }

    /// Remove `element`, tombstoning every tag currently observed for it
    ///
    /// Returns the tombstoned tags, which a remote replica needs to reproduce
    /// the remove.
    pub fn remove(&mut self, element: &Payload) -> Result<Vec<Dot>> {
        let observed = self.live_tags(element);
        if observed.is_empty() {
            return Err(CrdtError::InvalidOperation(format!(
                "cannot remove {} from set: element is not present",
                element
            )));
        }
        self.tombstones.extend(observed.iter().cloned());
        Ok(observed)
    }

    /// Apply a remove observed elsewhere
    pub fn remove_observed<'a>(&mut self, observed: impl IntoIterator<Item = &'a Dot>) {
        self.tombstones.extend(observed.into_iter().cloned());
    }

    /// Tags of `element` that are not tombstoned
    pub fn live_tags(&self, element: &Payload) -> Vec<Dot> {
        self.added
            .get(element)
            .map(|tags| tags.difference(&self.tombstones).cloned().collect())
            .unwrap_or_default()
    }

    /// Check if element is in the set
    pub fn contains(&self, element: &Payload) -> bool {
        self.added
            .get(element)
            .map(|tags| tags.iter().any(|tag| !self.tombstones.contains(tag)))
            .unwrap_or(false)
    }

    /// Get all elements currently in the set
    pub fn elements(&self) -> BTreeSet<Payload> {
        self.added
            .iter()
            .filter(|(_, tags)| tags.iter().any(|tag| !self.tombstones.contains(tag)))
            .map(|(element, _)| element.clone())
            .collect()
    }

    /// Get size of the set
    pub fn len(&self) -> usize {
        self.elements().len()
    }

    /// Check if set is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tombstoned tags
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }
}

impl Mergeable for OrSet {
    fn merge(&self, other: &Self) -> Self {
        let mut added = self.added.clone();
        for (element, tags) in &other.added {
            added
                .entry(element.clone())
                .or_default()
                .extend(tags.iter().cloned());
        }
        let tombstones = self.tombstones.union(&other.tombstones).cloned().collect();
        Self { added, tombstones }
    }
}
