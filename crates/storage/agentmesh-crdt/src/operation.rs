//! Replicated operations
//!
//! An [`Operation`] describes one local mutation with enough context to be
//! replayed on any replica, in any order, any number of times. Operations are
//! built once, at mutation time, and are read-only afterwards.

use crate::{
    clock::VectorClock,
    crdt::CrdtType,
    error::{CrdtError, Result},
    types::{AgentId, Dot, Payload, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

/// Kind of mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Increment,
    Decrement,
    Add,
    Remove,
    Set,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Increment => "increment",
            OperationKind::Decrement => "decrement",
            OperationKind::Add => "add",
            OperationKind::Remove => "remove",
            OperationKind::Set => "set",
        };
        f.write_str(name)
    }
}

/// Immutable description of a single mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    id: Uuid,
    kind: OperationKind,
    target_crdt_id: String,
    target_crdt_type: CrdtType,
    /// Map key, for operations addressed to a map entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    /// Variant of the map entry the operation targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nested_type: Option<CrdtType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Payload>,
    /// Add tags a remove observed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    observed: Vec<Dot>,
    vector_clock: VectorClock,
    origin_agent_id: AgentId,
    timestamp: Timestamp,
}

impl Operation {
    /// Start building an operation stamped with a snapshot of `vector_clock`
    pub fn new(
        kind: OperationKind,
        target_crdt_id: impl Into<String>,
        target_crdt_type: CrdtType,
        vector_clock: VectorClock,
        origin_agent_id: AgentId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target_crdt_id: target_crdt_id.into(),
            target_crdt_type,
            key: None,
            nested_type: None,
            value: None,
            observed: Vec::new(),
            vector_clock,
            origin_agent_id,
            timestamp: Timestamp::now(),
        }
    }

    /// Address a map entry
    pub fn with_key(mut self, key: impl Into<String>, nested_type: CrdtType) -> Self {
        self.key = Some(key.into());
        self.nested_type = Some(nested_type);
        self
    }

    pub fn with_value(mut self, value: Payload) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_observed(mut self, observed: Vec<Dot>) -> Self {
        self.observed = observed;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn target_crdt_id(&self) -> &str {
        &self.target_crdt_id
    }

    pub fn target_crdt_type(&self) -> CrdtType {
        self.target_crdt_type
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn nested_type(&self) -> Option<CrdtType> {
        self.nested_type
    }

    pub fn value(&self) -> Option<&Payload> {
        self.value.as_ref()
    }

    pub fn observed(&self) -> &[Dot] {
        &self.observed
    }

    pub fn vector_clock(&self) -> &VectorClock {
        &self.vector_clock
    }

    pub fn origin_agent_id(&self) -> &AgentId {
        &self.origin_agent_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The causal event this operation represents
    pub fn dot(&self) -> Dot {
        Dot::new(
            self.origin_agent_id.clone(),
            self.vector_clock.get(&self.origin_agent_id),
        )
    }

    /// Payload, required for add and set
    pub fn require_value(&self) -> Result<&Payload> {
        self.value.as_ref().ok_or_else(|| {
            CrdtError::InvalidOperation(format!("{} operation {} carries no value", self.kind, self.id))
        })
    }

    /// Positive amount of a counter operation
    pub fn amount(&self) -> Result<u64> {
        match self.value {
            Some(Payload::Int(n)) if n > 0 => Ok(n as u64),
            _ => Err(CrdtError::InvalidOperation(format!(
                "{} operation {} needs a positive integer amount",
                self.kind, self.id
            ))),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.target_crdt_id)?;
        if let Some(key) = &self.key {
            write!(f, "[{}]", key)?;
        }
        write!(f, " from {} at {}", self.origin_agent_id, self.vector_clock)
    }
}
