//! Synchronization records
//!
//! Per-peer bookkeeping and the values a synchronization round hands back to
//! the transport layer.

use crate::{clock::VectorClock, crdt::Crdt, operation::Operation, types::AgentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened to a single incoming operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Applied to its CRDT and appended to the log
    Applied,
    /// Already reflected in local state; dropped
    Duplicate,
    /// Waiting for causal predecessors
    Deferred,
}

/// Bookkeeping for one remote agent, replaced after every exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// State vector the peer reported in the last exchange
    pub last_sync_vector: VectorClock,
    /// Operations from this peer still waiting for causal predecessors
    pub pending_operations: usize,
    pub conflict_count: usize,
    pub merge_count: usize,
    pub last_sync_time: DateTime<Utc>,
}

/// Outcome of one `synchronize_with` round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    /// No incoming operation was rejected
    pub success: bool,
    pub applied_operations: usize,
    pub conflicts: usize,
    /// Incoming operations buffered for later delivery
    pub deferred_operations: usize,
    /// Operations the remote has not seen, for the transport to send back
    pub delta: Vec<Operation>,
    /// The delta is incomplete because history the remote lacks was compacted;
    /// send a [`StateSnapshot`] instead
    pub full_state_required: bool,
    pub sync_time_ms: u64,
}

/// Aggregated view over every peer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    pub total_peers: usize,
    pub total_merges: usize,
    pub total_conflicts: usize,
    /// conflicts / (merges + conflicts), 0 when nothing was exchanged
    pub conflict_rate: f64,
    pub operation_log_len: usize,
    pub crdt_count: usize,
    pub pending_operations: usize,
}

/// Full state of a replica, used when delta history is no longer available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub agent_id: AgentId,
    pub state_vector: VectorClock,
    pub crdts: BTreeMap<String, Crdt>,
}

/// Outcome of merging a [`StateSnapshot`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    /// CRDTs merged into an existing local replica
    pub merged: usize,
    /// CRDTs that did not exist locally and were adopted
    pub adopted: usize,
    /// CRDT ids rejected because the variants disagree
    pub rejected: Vec<String>,
    /// Buffered operations applied once the snapshot filled their gaps
    pub released_operations: usize,
}
