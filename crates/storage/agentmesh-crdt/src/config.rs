//! Synchronizer configuration
//!
//! Everything is supplied by the embedding application at construction time.

use crate::{
    error::{CrdtError, Result},
    types::AgentId,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How `garbage_collect` decides which log entries may go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcPolicy {
    /// Drop an old entry only once every known peer has acknowledged it
    #[default]
    Safe,
    /// Drop every entry older than the cutoff; lagging peers need a full-state resync
    AgeOnly,
}

/// Configuration for a [`CrdtSynchronizer`](crate::CrdtSynchronizer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynchronizerConfig {
    /// Identity of the local agent
    pub agent_id: AgentId,
    /// Age after which log entries become eligible for garbage collection
    #[serde(with = "duration_millis")]
    pub retention: Duration,
    pub gc_policy: GcPolicy,
    /// Upper bound on operations waiting for causal predecessors
    pub max_pending_operations: usize,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            agent_id: AgentId::random(),
            retention: Duration::from_secs(3600),
            gc_policy: GcPolicy::Safe,
            max_pending_operations: 10_000,
        }
    }
}

impl SynchronizerConfig {
    /// Default configuration for `agent_id`
    pub fn new(agent_id: impl Into<AgentId>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Self::default()
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_gc_policy(mut self, gc_policy: GcPolicy) -> Self {
        self.gc_policy = gc_policy;
        self
    }

    pub fn with_max_pending_operations(mut self, max: usize) -> Self {
        self.max_pending_operations = max;
        self
    }

    /// Reject configurations the synchronizer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.agent_id.as_str().is_empty() {
            return Err(CrdtError::Config("agent_id must not be empty".to_string()));
        }
        if self.max_pending_operations == 0 {
            return Err(CrdtError::Config(
                "max_pending_operations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SynchronizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gc_policy, GcPolicy::Safe);
    }

    #[test]
    fn test_empty_agent_id_rejected() {
        let config = SynchronizerConfig::new("");
        assert!(matches!(config.validate(), Err(CrdtError::Config(_))));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: SynchronizerConfig = serde_json::from_str(
            r#"{"agent_id":"planner","retention":60000,"gc_policy":"age_only"}"#,
        )
        .unwrap();
        assert_eq!(config.agent_id, AgentId::new("planner"));
        assert_eq!(config.retention, Duration::from_secs(60));
        assert_eq!(config.gc_policy, GcPolicy::AgeOnly);
        assert_eq!(config.max_pending_operations, 10_000);
    }
}
