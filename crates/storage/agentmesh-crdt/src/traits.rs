//! Core traits for CRDT implementations

use crate::{
    clock::VectorClock,
    operation::Operation,
    sync::{SyncResult, SyncStats},
    types::AgentId,
    Result,
};
use async_trait::async_trait;

/// Join-semilattice state
///
/// `merge` must be commutative, associative and idempotent, and must leave both
/// inputs untouched.
pub trait Mergeable: Sized {
    /// Least upper bound of `self` and `other` as a new value
    fn merge(&self, other: &Self) -> Self;

    /// Merge `other` into `self`
    fn merge_in_place(&mut self, other: &Self) {
        *self = self.merge(other);
    }
}

/// Uniform interface shared by every coordination subsystem of an agent
///
/// Quorum-based neighbours answer the quorum queries for real. CRDTs converge
/// without voting, so the CRDT implementation answers them trivially.
#[async_trait]
pub trait ConsistencyStrategy: Send {
    /// Short name used in logs
    fn strategy_name(&self) -> &'static str;

    /// Exchange one batch of operations with a remote agent
    async fn synchronize(
        &mut self,
        remote_agent: &AgentId,
        remote_operations: Vec<Operation>,
        remote_state_vector: &VectorClock,
    ) -> Result<SyncResult>;

    /// Whether enough participants agree for the state to be authoritative
    fn has_quorum(&self) -> bool;

    /// Minimum number of participants required for a quorum
    fn min_quorum(&self) -> usize;

    /// Aggregated synchronization statistics
    fn stats(&self) -> SyncStats;
}
