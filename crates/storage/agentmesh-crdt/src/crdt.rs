//! Replicated values
//!
//! A [`Crdt`] couples an identifier, an embedded vector clock and metadata with
//! one of six concrete states. The state is a closed enum, so every merge and
//! every operation dispatch is an exhaustive `match`.

use crate::{
    clock::VectorClock,
    error::{CrdtError, Result},
    g_counter::GCounter,
    lww_register::LwwRegister,
    map::CrdtMap,
    mv_register::MvRegister,
    operation::{Operation, OperationKind},
    or_set::OrSet,
    pn_counter::PnCounter,
    traits::Mergeable,
    types::{AgentId, Dot, Payload, Timestamp},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
    str::FromStr,
};

/// Type tag of a CRDT variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrdtType {
    GCounter,
    PnCounter,
    OrSet,
    LwwRegister,
    MvRegister,
    Map,
}

impl CrdtType {
    pub const ALL: [CrdtType; 6] = [
        CrdtType::GCounter,
        CrdtType::PnCounter,
        CrdtType::OrSet,
        CrdtType::LwwRegister,
        CrdtType::MvRegister,
        CrdtType::Map,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrdtType::GCounter => "g_counter",
            CrdtType::PnCounter => "pn_counter",
            CrdtType::OrSet => "or_set",
            CrdtType::LwwRegister => "lww_register",
            CrdtType::MvRegister => "mv_register",
            CrdtType::Map => "map",
        }
    }
}

impl Display for CrdtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrdtType {
    type Err = CrdtError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "gcounter" => Ok(CrdtType::GCounter),
            "pncounter" => Ok(CrdtType::PnCounter),
            "orset" => Ok(CrdtType::OrSet),
            "lwwregister" | "lww" => Ok(CrdtType::LwwRegister),
            "mvregister" | "mv" => Ok(CrdtType::MvRegister),
            "map" | "crdtmap" => Ok(CrdtType::Map),
            _ => Err(CrdtError::UnsupportedType(s.to_string())),
        }
    }
}

/// Observable value of a CRDT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Count(u64),
    Signed(i64),
    Set(BTreeSet<Payload>),
    Register(Option<Payload>),
    MultiValue(Vec<Payload>),
    Map(BTreeMap<String, Value>),
}

/// Concrete state of a CRDT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "state", rename_all = "snake_case")]
pub enum CrdtState {
    GCounter(GCounter),
    PnCounter(PnCounter),
    OrSet(OrSet),
    LwwRegister(LwwRegister),
    MvRegister(MvRegister),
    Map(CrdtMap),
}

impl CrdtState {
    /// Empty state of the given variant
    pub fn empty(crdt_type: CrdtType) -> Self {
        match crdt_type {
            CrdtType::GCounter => CrdtState::GCounter(GCounter::new()),
            CrdtType::PnCounter => CrdtState::PnCounter(PnCounter::new()),
            CrdtType::OrSet => CrdtState::OrSet(OrSet::new()),
            CrdtType::LwwRegister => CrdtState::LwwRegister(LwwRegister::new()),
            CrdtType::MvRegister => CrdtState::MvRegister(MvRegister::new()),
            CrdtType::Map => CrdtState::Map(CrdtMap::new()),
        }
    }

    pub fn crdt_type(&self) -> CrdtType {
        match self {
            CrdtState::GCounter(_) => CrdtType::GCounter,
            CrdtState::PnCounter(_) => CrdtType::PnCounter,
            CrdtState::OrSet(_) => CrdtType::OrSet,
            CrdtState::LwwRegister(_) => CrdtType::LwwRegister,
            CrdtState::MvRegister(_) => CrdtType::MvRegister,
            CrdtState::Map(_) => CrdtType::Map,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            CrdtState::GCounter(counter) => Value::Count(counter.value()),
            CrdtState::PnCounter(counter) => Value::Signed(counter.value()),
            CrdtState::OrSet(set) => Value::Set(set.elements()),
            CrdtState::LwwRegister(register) => Value::Register(register.get().cloned()),
            CrdtState::MvRegister(register) => {
                Value::MultiValue(register.concurrent_values().into_iter().cloned().collect())
            }
            CrdtState::Map(map) => Value::Map(
                map.iter()
                    .map(|(key, crdt)| (key.to_string(), crdt.value()))
                    .collect(),
            ),
        }
    }

    /// Variant-specific merge; mismatched variants are rejected
    pub fn try_merge(&self, other: &CrdtState) -> Result<CrdtState> {
        let merged = match (self, other) {
            (CrdtState::GCounter(a), CrdtState::GCounter(b)) => CrdtState::GCounter(a.merge(b)),
            (CrdtState::PnCounter(a), CrdtState::PnCounter(b)) => CrdtState::PnCounter(a.merge(b)),
            (CrdtState::OrSet(a), CrdtState::OrSet(b)) => CrdtState::OrSet(a.merge(b)),
            (CrdtState::LwwRegister(a), CrdtState::LwwRegister(b)) => {
                CrdtState::LwwRegister(a.merge(b))
            }
            (CrdtState::MvRegister(a), CrdtState::MvRegister(b)) => {
                CrdtState::MvRegister(a.merge(b))
            }
            (CrdtState::Map(a), CrdtState::Map(b)) => CrdtState::Map(a.try_merge(b)?),
            (mine, theirs) => {
                return Err(CrdtError::TypeMismatch {
                    expected: mine.crdt_type(),
                    actual: theirs.crdt_type(),
                })
            }
        };
        Ok(merged)
    }
}

/// Observability metadata; never used for conflict resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub owner: AgentId,
    pub last_modified: DateTime<Utc>,
    /// Bumped on every local mutation and successful merge
    pub version: u64,
}

/// A replicated value of any variant
///
/// Equality compares identity, clock and state; metadata is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crdt {
    id: String,
    clock: VectorClock,
    metadata: Metadata,
    state: CrdtState,
}

impl PartialEq for Crdt {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.clock == other.clock && self.state == other.state
    }
}

impl Eq for Crdt {}

impl Crdt {
    /// Create an empty CRDT owned by `owner`
    pub fn new(id: impl Into<String>, crdt_type: CrdtType, owner: AgentId) -> Self {
        Self {
            id: id.into(),
            clock: VectorClock::new(),
            metadata: Metadata {
                owner,
                last_modified: Utc::now(),
                version: 0,
            },
            state: CrdtState::empty(crdt_type),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn crdt_type(&self) -> CrdtType {
        self.state.crdt_type()
    }

    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn state(&self) -> &CrdtState {
        &self.state
    }

    pub fn value(&self) -> Value {
        self.state.value()
    }

    fn owner(&self) -> AgentId {
        self.metadata.owner.clone()
    }

    fn touch(&mut self) {
        self.metadata.version += 1;
        self.metadata.last_modified = Utc::now();
    }

    /// Advance the embedded clock for a local mutation and return its dot
    fn tick(&mut self) -> Dot {
        let owner = self.owner();
        let counter = self.clock.increment(&owner);
        self.touch();
        Dot::new(owner, counter)
    }

    /// Increment a counter
    pub fn increment(&mut self, amount: u64) -> Result<()> {
        let owner = self.owner();
        let crdt_type = self.crdt_type();
        match &mut self.state {
            CrdtState::GCounter(counter) => counter.increment(&owner, amount),
            CrdtState::PnCounter(counter) => counter.increment(&owner, amount),
            _ => return Err(unsupported(OperationKind::Increment, crdt_type)),
        }
        self.tick();
        Ok(())
    }

    /// Decrement a PN-Counter
    pub fn decrement(&mut self, amount: u64) -> Result<()> {
        let owner = self.owner();
        let crdt_type = self.crdt_type();
        match &mut self.state {
            CrdtState::PnCounter(counter) => counter.decrement(&owner, amount),
            _ => return Err(unsupported(OperationKind::Decrement, crdt_type)),
        }
        self.tick();
        Ok(())
    }

    /// Add an element to an OR-Set
    pub fn add(&mut self, element: Payload) -> Result<()> {
        if !matches!(self.state, CrdtState::OrSet(_)) {
            return Err(unsupported(OperationKind::Add, self.crdt_type()));
        }
        let tag = self.tick();
        if let CrdtState::OrSet(set) = &mut self.state {
            set.add(element, tag);
        }
        Ok(())
    }

    /// Remove an element from an OR-Set, returning the tombstoned tags
    pub fn remove(&mut self, element: &Payload) -> Result<Vec<Dot>> {
        let crdt_type = self.crdt_type();
        let observed = match &mut self.state {
            CrdtState::OrSet(set) => set.remove(element)?,
            _ => return Err(unsupported(OperationKind::Remove, crdt_type)),
        };
        self.tick();
        Ok(observed)
    }

    /// Write a register at the current wall-clock time
    pub fn set(&mut self, value: Payload) -> Result<()> {
        self.set_at(value, Timestamp::now())
    }

    /// Write a register with an explicit timestamp
    ///
    /// The timestamp only matters for LWW registers; MV registers order writes
    /// by the embedded clock.
    pub fn set_at(&mut self, value: Payload, timestamp: Timestamp) -> Result<()> {
        if !matches!(self.state, CrdtState::LwwRegister(_) | CrdtState::MvRegister(_)) {
            return Err(unsupported(OperationKind::Set, self.crdt_type()));
        }
        let dot = self.tick();
        let clock = self.clock.copy();
        match &mut self.state {
            CrdtState::LwwRegister(register) => {
                register.set(value, timestamp, dot.agent, dot.counter);
            }
            CrdtState::MvRegister(register) => register.set(dot.agent, value, clock),
            _ => {}
        }
        Ok(())
    }

    /// Mutate the map entry under `key`, creating it as `nested_type` on first use
    pub fn update_entry<F>(&mut self, key: &str, nested_type: CrdtType, f: F) -> Result<()>
    where
        F: FnOnce(&mut Crdt) -> Result<()>,
    {
        let owner = self.owner();
        let map_id = self.id.clone();
        let crdt_type = self.crdt_type();
        let map = match &mut self.state {
            CrdtState::Map(map) => map,
            _ => {
                return Err(CrdtError::InvalidOperation(format!(
                    "{} has no entries",
                    crdt_type
                )))
            }
        };
        map.check_entry(key, nested_type)?;
        let mut nested = map
            .get(key)
            .cloned()
            .unwrap_or_else(|| Crdt::new(CrdtMap::nested_id(&map_id, key), nested_type, owner.clone()));
        f(&mut nested)?;
        *map.entry(&map_id, key, nested_type, &owner)? = nested;
        self.tick();
        Ok(())
    }

    /// Nested CRDT of a map
    pub fn entry(&self, key: &str) -> Option<&Crdt> {
        match &self.state {
            CrdtState::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Live add tags of `element`, in this set or in the set under `key`
    pub fn live_tags(&self, key: Option<&str>, element: &Payload) -> Vec<Dot> {
        let target = match key {
            Some(key) => match self.entry(key) {
                Some(nested) => nested,
                None => return Vec::new(),
            },
            None => self,
        };
        match &target.state {
            CrdtState::OrSet(set) => set.live_tags(element),
            _ => Vec::new(),
        }
    }

    /// Check that `op` can be applied without touching any state
    pub fn validate_operation(&self, op: &Operation) -> Result<()> {
        if op.target_crdt_type() != self.crdt_type() {
            return Err(CrdtError::TypeMismatch {
                expected: self.crdt_type(),
                actual: op.target_crdt_type(),
            });
        }
        match &self.state {
            CrdtState::Map(map) => {
                let (key, nested_type) = match (op.key(), op.nested_type()) {
                    (Some(key), Some(nested_type)) => (key, nested_type),
                    _ => {
                        return Err(CrdtError::InvalidOperation(format!(
                            "map operation {} needs a key and a nested type",
                            op.id()
                        )))
                    }
                };
                map.check_entry(key, nested_type)?;
                validate_leaf(nested_type, op)
            }
            _ => validate_leaf(self.crdt_type(), op),
        }
    }

    /// Replay an operation produced by any replica
    ///
    /// The caller is responsible for deduplication; this only validates and
    /// applies. On error nothing is modified.
    pub fn apply(&mut self, op: &Operation) -> Result<()> {
        self.validate_operation(op)?;
        let owner = self.owner();
        let map_id = self.id.clone();
        match &mut self.state {
            CrdtState::Map(map) => {
                // validated above
                if let (Some(key), Some(nested_type)) = (op.key(), op.nested_type()) {
                    let nested = map.entry(&map_id, key, nested_type, &owner)?;
                    nested.apply_leaf(op);
                    nested.clock.merge(op.vector_clock());
                    nested.touch();
                }
            }
            _ => self.apply_leaf(op),
        }
        self.clock.merge(op.vector_clock());
        self.touch();
        Ok(())
    }

    /// Apply a validated operation to a non-map state
    fn apply_leaf(&mut self, op: &Operation) {
        let origin = op.origin_agent_id();
        match (&mut self.state, op.kind()) {
            (CrdtState::GCounter(counter), OperationKind::Increment) => {
                counter.increment(origin, op.amount().unwrap_or(0))
            }
            (CrdtState::PnCounter(counter), OperationKind::Increment) => {
                counter.increment(origin, op.amount().unwrap_or(0))
            }
            (CrdtState::PnCounter(counter), OperationKind::Decrement) => {
                counter.decrement(origin, op.amount().unwrap_or(0))
            }
            (CrdtState::OrSet(set), OperationKind::Add) => {
                if let Some(element) = op.value() {
                    set.add(element.clone(), op.dot());
                }
            }
            (CrdtState::OrSet(set), OperationKind::Remove) => set.remove_observed(op.observed()),
            (CrdtState::LwwRegister(register), OperationKind::Set) => {
                if let Some(value) = op.value() {
                    register.set(
                        value.clone(),
                        op.timestamp(),
                        origin.clone(),
                        op.dot().counter,
                    );
                }
            }
            (CrdtState::MvRegister(register), OperationKind::Set) => {
                if let Some(value) = op.value() {
                    register.set(origin.clone(), value.clone(), op.vector_clock().copy());
                }
            }
            _ => {}
        }
    }

    /// Merge with another replica of the same CRDT into a new instance
    pub fn merge(&self, other: &Crdt) -> Result<Crdt> {
        if self.id != other.id {
            return Err(CrdtError::IdMismatch {
                left: self.id.clone(),
                right: other.id.clone(),
            });
        }
        let state = self.state.try_merge(&other.state)?;
        Ok(Crdt {
            id: self.id.clone(),
            clock: self.clock.merged(&other.clock),
            metadata: Metadata {
                owner: self.metadata.owner.clone(),
                last_modified: Utc::now(),
                version: self.metadata.version.max(other.metadata.version) + 1,
            },
            state,
        })
    }

    /// Copy of a replica received from elsewhere, re-owned by `owner`
    pub(crate) fn adopt(&self, owner: AgentId) -> Crdt {
        let mut adopted = self.clone();
        adopted.metadata.owner = owner;
        adopted.touch();
        adopted
    }
}

fn unsupported(kind: OperationKind, crdt_type: CrdtType) -> CrdtError {
    CrdtError::InvalidOperation(format!("{} is not supported by {}", kind, crdt_type))
}

/// Kind/payload validation for a leaf variant
fn validate_leaf(crdt_type: CrdtType, op: &Operation) -> Result<()> {
    let supported = matches!(
        (crdt_type, op.kind()),
        (CrdtType::GCounter, OperationKind::Increment)
            | (CrdtType::PnCounter, OperationKind::Increment | OperationKind::Decrement)
            | (CrdtType::OrSet, OperationKind::Add | OperationKind::Remove)
            | (CrdtType::LwwRegister | CrdtType::MvRegister, OperationKind::Set)
    );
    if !supported {
        return Err(unsupported(op.kind(), crdt_type));
    }
    match op.kind() {
        OperationKind::Increment | OperationKind::Decrement => op.amount().map(|_| ()),
        OperationKind::Add | OperationKind::Set => op.require_value().map(|_| ()),
        OperationKind::Remove if op.observed().is_empty() => Err(CrdtError::InvalidOperation(
            format!("remove operation {} observed no tags", op.id()),
        )),
        OperationKind::Remove => Ok(()),
    }
}

impl Display for Crdt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] v{} {}",
            self.crdt_type(),
            self.id,
            self.metadata.version,
            self.clock
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(id: &str, crdt_type: CrdtType, owner: &str) -> Crdt {
        Crdt::new(id, crdt_type, AgentId::new(owner))
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("g_counter".parse::<CrdtType>().unwrap(), CrdtType::GCounter);
        assert_eq!("PN-Counter".parse::<CrdtType>().unwrap(), CrdtType::PnCounter);
        assert_eq!("lww".parse::<CrdtType>().unwrap(), CrdtType::LwwRegister);
        assert!(matches!(
            "rga".parse::<CrdtType>(),
            Err(CrdtError::UnsupportedType(_))
        ));
        for crdt_type in CrdtType::ALL {
            assert_eq!(crdt_type.as_str().parse::<CrdtType>().unwrap(), crdt_type);
        }
    }

    #[test]
    fn test_mutators_tick_clock_and_version() {
        let mut counter = replica("hits", CrdtType::GCounter, "a1");
        counter.increment(2).unwrap();
        counter.increment(1).unwrap();

        assert_eq!(counter.value(), Value::Count(3));
        assert_eq!(counter.clock().get(&AgentId::new("a1")), 2);
        assert_eq!(counter.metadata().version, 2);
    }

    #[test]
    fn test_unsupported_mutation_is_rejected() {
        let mut counter = replica("hits", CrdtType::GCounter, "a1");
        assert!(matches!(counter.decrement(1), Err(CrdtError::InvalidOperation(_))));
        assert!(matches!(counter.add("x".into()), Err(CrdtError::InvalidOperation(_))));
        assert_eq!(counter.metadata().version, 0);
    }

    #[test]
    fn test_merge_rejects_mismatched_variants() {
        let counter = replica("shared", CrdtType::GCounter, "a1");
        let set = replica("shared", CrdtType::OrSet, "a2");
        assert!(matches!(
            counter.merge(&set),
            Err(CrdtError::TypeMismatch {
                expected: CrdtType::GCounter,
                actual: CrdtType::OrSet
            })
        ));
    }

    #[test]
    fn test_merge_rejects_mismatched_ids() {
        let left = replica("left", CrdtType::GCounter, "a1");
        let right = replica("right", CrdtType::GCounter, "a1");
        assert!(matches!(left.merge(&right), Err(CrdtError::IdMismatch { .. })));
    }

    #[test]
    fn test_merge_leaves_inputs_untouched() {
        let mut left = replica("hits", CrdtType::PnCounter, "a1");
        left.increment(10).unwrap();
        let mut right = replica("hits", CrdtType::PnCounter, "a2");
        right.decrement(3).unwrap();
        let (left_before, right_before) = (left.clone(), right.clone());

        let merged = left.merge(&right).unwrap();
        assert_eq!(merged.value(), Value::Signed(7));
        assert_eq!(left, left_before);
        assert_eq!(right, right_before);
        assert!(merged.metadata().version > left.metadata().version);
    }

    #[test]
    fn test_map_merges_nested_variants_recursively() {
        let mut left = replica("profile", CrdtType::Map, "a1");
        left.update_entry("visits", CrdtType::GCounter, |c| c.increment(2))
            .unwrap();
        left.update_entry("name", CrdtType::LwwRegister, |r| {
            r.set_at("ada".into(), Timestamp::from_millis(10))
        })
        .unwrap();

        let mut right = replica("profile", CrdtType::Map, "a2");
        right
            .update_entry("visits", CrdtType::GCounter, |c| c.increment(5))
            .unwrap();
        right
            .update_entry("tags", CrdtType::OrSet, |s| s.add("admin".into()))
            .unwrap();

        let merged = left.merge(&right).unwrap();
        assert_eq!(merged, right.merge(&left).unwrap());

        let expected: BTreeMap<String, Value> = [
            ("name".to_string(), Value::Register(Some("ada".into()))),
            (
                "tags".to_string(),
                Value::Set(["admin".into()].into_iter().collect()),
            ),
            ("visits".to_string(), Value::Count(7)),
        ]
        .into_iter()
        .collect();
        assert_eq!(merged.value(), Value::Map(expected));
        assert_eq!(merged.entry("visits").unwrap().id(), "profile/visits");
    }

    #[test]
    fn test_map_entry_type_is_fixed() {
        let mut map = replica("profile", CrdtType::Map, "a1");
        map.update_entry("visits", CrdtType::GCounter, |c| c.increment(1))
            .unwrap();
        let err = map
            .update_entry("visits", CrdtType::OrSet, |s| s.add("x".into()))
            .unwrap_err();
        assert!(matches!(err, CrdtError::TypeMismatch { .. }));
    }

    #[test]
    fn test_map_merge_rejects_conflicting_nested_types() {
        let mut left = replica("profile", CrdtType::Map, "a1");
        left.update_entry("k", CrdtType::GCounter, |c| c.increment(1))
            .unwrap();
        let mut right = replica("profile", CrdtType::Map, "a2");
        right
            .update_entry("k", CrdtType::OrSet, |s| s.add("x".into()))
            .unwrap();

        assert!(matches!(left.merge(&right), Err(CrdtError::TypeMismatch { .. })));
    }

    #[test]
    fn test_apply_rejects_wrong_kind_without_mutation() {
        let mut set = replica("tags", CrdtType::OrSet, "a1");
        let op = Operation::new(
            OperationKind::Increment,
            "tags",
            CrdtType::OrSet,
            VectorClock::new(),
            AgentId::new("a2"),
        )
        .with_value(Payload::Int(1));
        let before = set.clone();

        assert!(matches!(set.apply(&op), Err(CrdtError::InvalidOperation(_))));
        assert_eq!(set, before);
        assert_eq!(set.metadata().version, 0);
    }

    #[test]
    fn test_mv_register_set_uses_embedded_clock() {
        let mut reg = replica("status", CrdtType::MvRegister, "a1");
        reg.set("draft".into()).unwrap();
        reg.set("final".into()).unwrap();
        assert_eq!(reg.value(), Value::MultiValue(vec!["final".into()]));
    }
}
