//! Core types shared by every CRDT

use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    time::{SystemTime, UNIX_EPOCH},
};
use uuid::Uuid;

/// Identifier of an agent owning a replica
///
/// Ordering is lexicographic on the underlying string; LWW tie-breaks rely on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create an agent ID from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a random agent ID
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Wall-clock timestamp in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create timestamp from current system time
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as u64)
    }

    /// Create timestamp from value
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Get timestamp value
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Timestamp `millis` earlier, saturating at the epoch
    pub fn saturating_sub_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_sub(millis))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single causal event: the `counter`-th event of `agent`
///
/// Dots are the unique add tags of the OR-Set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dot {
    pub agent: AgentId,
    pub counter: u64,
}

impl Dot {
    pub fn new(agent: AgentId, counter: u64) -> Self {
        Self { agent, counter }
    }
}

impl Display for Dot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.agent, self.counter)
    }
}

/// Replicated payload carried by registers, sets and operations
///
/// Payloads must be totally ordered to serve as set elements, so there is no
/// float variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Payload>),
}

impl Payload {
    /// Integer content, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Payload::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Text content, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Null => f.write_str("null"),
            Payload::Bool(b) => write!(f, "{}", b),
            Payload::Int(n) => write!(f, "{}", n),
            Payload::Text(s) => write!(f, "{:?}", s),
            Payload::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Payload::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Int(n)
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Bool(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Payload::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_ordering_is_lexicographic() {
        assert!(AgentId::new("a2") > AgentId::new("a1"));
        assert!(AgentId::new("b") > AgentId::new("a9"));
    }

    #[test]
    fn test_payload_serializes_tagged() {
        let json = serde_json::to_string(&Payload::from("foo")).unwrap();
        assert_eq!(json, r#"{"type":"text","value":"foo"}"#);

        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Payload::Text("foo".to_string()));
    }

    #[test]
    fn test_timestamp_saturating_sub() {
        assert_eq!(Timestamp::from_millis(5).saturating_sub_millis(10), Timestamp::from_millis(0));
        assert_eq!(Timestamp::from_millis(50).saturating_sub_millis(10).as_millis(), 40);
    }
}
