//! CRDT Map: string keys to nested CRDTs of any variant
//!
//! Keys are never removed. Merge is the union of keys; values present on both
//! sides merge recursively with their own variant's rule.

use crate::{
    crdt::{Crdt, CrdtType},
    error::{CrdtError, Result},
    types::AgentId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrdtMap {
    entries: BTreeMap<String, Crdt>,
}

impl CrdtMap {
    /// Create new empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier given to the nested CRDT stored under `key` of map `map_id`
    pub fn nested_id(map_id: &str, key: &str) -> String {
        format!("{}/{}", map_id, key)
    }

    /// Nested CRDT under `key`
    pub fn get(&self, key: &str) -> Option<&Crdt> {
        self.entries.get(key)
    }

    /// Check that `key` can hold a CRDT of type `nested_type`
    pub fn check_entry(&self, key: &str, nested_type: CrdtType) -> Result<()> {
        match self.entries.get(key) {
            Some(existing) if existing.crdt_type() != nested_type => Err(CrdtError::TypeMismatch {
                expected: existing.crdt_type(),
                actual: nested_type,
            }),
            _ => Ok(()),
        }
    }

    /// Nested CRDT under `key`, created empty on first use
    pub fn entry(
        &mut self,
        map_id: &str,
        key: &str,
        nested_type: CrdtType,
        owner: &AgentId,
    ) -> Result<&mut Crdt> {
        self.check_entry(key, nested_type)?;
        Ok(self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Crdt::new(CrdtMap::nested_id(map_id, key), nested_type, owner.clone())))
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Crdt)> {
        self.entries.iter().map(|(key, crdt)| (key.as_str(), crdt))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of keys with recursive merge of shared keys
    pub fn try_merge(&self, other: &Self) -> Result<Self> {
        let mut entries = self.entries.clone();
        for (key, theirs) in &other.entries {
            let merged = match entries.get(key) {
                Some(mine) => mine.merge(theirs)?,
                None => theirs.clone(),
            };
            entries.insert(key.clone(), merged);
        }
        Ok(Self { entries })
    }
}
