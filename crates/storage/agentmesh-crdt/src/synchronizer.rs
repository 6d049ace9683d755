//! CRDT synchronizer
//!
//! One [`CrdtSynchronizer`] per agent owns the CRDT registry, the append-only
//! operation log and the per-peer [`SyncState`]. It never performs I/O: the
//! transport hands it already-received operations and a remote state vector,
//! and forwards whatever delta it returns.
//!
//! Delivery is causal. An incoming operation is first checked against the
//! target CRDT's clock; anything `Before` or `Equal` is a redelivery and is
//! dropped. A fresh operation whose predecessors have not arrived yet is
//! buffered and released as soon as the gap closes, so batches may arrive in
//! any order and any number of times.

use crate::{
    clock::{is_causally_ready, ClockOrdering, VectorClock},
    config::{GcPolicy, SynchronizerConfig},
    crdt::{Crdt, CrdtType, Value},
    error::{CrdtError, Result},
    events::{EventListener, Listeners, SyncEvent},
    operation::{Operation, OperationKind},
    sync::{ApplyOutcome, SnapshotReport, StateSnapshot, SyncResult, SyncState, SyncStats},
    traits::ConsistencyStrategy,
    types::{AgentId, Dot, Payload, Timestamp},
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
    time::Instant,
};
use tracing::{debug, info, trace, warn};

/// Operation waiting for causal predecessors, with the peer it came from
#[derive(Debug, Clone)]
struct PendingOperation {
    operation: Operation,
    source: AgentId,
    /// Already rejected; only its dot is still owed to the clock
    rejected: bool,
}

/// Counters for one delivery round
#[derive(Debug, Default)]
struct Tally {
    applied: usize,
    conflicts: usize,
}

/// Registry, log and sync bookkeeping of one agent
#[derive(Debug)]
pub struct CrdtSynchronizer {
    config: SynchronizerConfig,
    clock: VectorClock,
    crdts: BTreeMap<String, Crdt>,
    log: Vec<Operation>,
    pending: VecDeque<PendingOperation>,
    sync_states: BTreeMap<AgentId, SyncState>,
    /// History no longer available as log entries
    log_floor: VectorClock,
    listeners: Listeners,
}

impl CrdtSynchronizer {
    /// Create a synchronizer for the agent named in `config`
    pub fn new(config: SynchronizerConfig) -> Result<Self> {
        config.validate()?;
        info!(agent = %config.agent_id, "created CRDT synchronizer");
        Ok(Self {
            config,
            clock: VectorClock::new(),
            crdts: BTreeMap::new(),
            log: Vec::new(),
            pending: VecDeque::new(),
            sync_states: BTreeMap::new(),
            log_floor: VectorClock::new(),
            listeners: Listeners::default(),
        })
    }

    /// Register an event listener
    pub fn with_listener<L: EventListener + 'static>(mut self, listener: L) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.config.agent_id
    }

    pub fn config(&self) -> &SynchronizerConfig {
        &self.config
    }

    /// Current state vector, as advertised to peers
    pub fn state_vector(&self) -> &VectorClock {
        &self.clock
    }

    pub fn get_crdt(&self, id: &str) -> Option<&Crdt> {
        self.crdts.get(id)
    }

    pub fn value(&self, id: &str) -> Option<Value> {
        self.crdts.get(id).map(Crdt::value)
    }

    pub fn crdt_ids(&self) -> impl Iterator<Item = &str> {
        self.crdts.keys().map(String::as_str)
    }

    pub fn operation_log(&self) -> &[Operation] {
        &self.log
    }

    /// Operations buffered until their causal predecessors arrive
    pub fn pending_operations(&self) -> usize {
        self.pending.iter().filter(|p| !p.rejected).count()
    }

    pub fn sync_state(&self, peer: &AgentId) -> Option<&SyncState> {
        self.sync_states.get(peer)
    }

    /// Create and register a CRDT
    ///
    /// An initial value is written through the normal mutation path, so it is
    /// logged and replicates like any other write. For an OR-Set a `List`
    /// seeds one element per item.
    pub fn create_crdt(
        &mut self,
        id: impl Into<String>,
        crdt_type: CrdtType,
        initial_value: Option<Payload>,
    ) -> Result<Crdt> {
        let id = id.into();
        if self.crdts.contains_key(&id) {
            return Err(CrdtError::AlreadyExists { id });
        }
        let seed = seed_operations(crdt_type, initial_value)?;

        let crdt = Crdt::new(id.clone(), crdt_type, self.agent_id().clone());
        self.crdts.insert(id.clone(), crdt.clone());
        info!(agent = %self.agent_id(), crdt = %id, crdt_type = %crdt_type, "created CRDT");
        self.listeners.emit(SyncEvent::CrdtCreated {
            id: id.clone(),
            crdt_type,
            crdt,
        });

        for (kind, value) in seed {
            self.mutate_local(&id, kind, None, Some(value), Vec::new())?;
        }
        self.crdts
            .get(&id)
            .cloned()
            .ok_or(CrdtError::CrdtNotFound { id })
    }

    /// Create a CRDT from a type name supplied by configuration or a peer
    pub fn create_crdt_named(
        &mut self,
        id: impl Into<String>,
        crdt_type: &str,
        initial_value: Option<Payload>,
    ) -> Result<Crdt> {
        let crdt_type = crdt_type.parse::<CrdtType>()?;
        self.create_crdt(id, crdt_type, initial_value)
    }

    pub fn increment(&mut self, id: &str, amount: u64) -> Result<Operation> {
        let amount = amount_payload(amount)?;
        self.mutate_local(id, OperationKind::Increment, None, Some(amount), Vec::new())
    }

    pub fn decrement(&mut self, id: &str, amount: u64) -> Result<Operation> {
        let amount = amount_payload(amount)?;
        self.mutate_local(id, OperationKind::Decrement, None, Some(amount), Vec::new())
    }

    pub fn add(&mut self, id: &str, element: Payload) -> Result<Operation> {
        self.mutate_local(id, OperationKind::Add, None, Some(element), Vec::new())
    }

    /// Remove an element, tombstoning only the add tags observed so far
    pub fn remove(&mut self, id: &str, element: Payload) -> Result<Operation> {
        let observed = self.observed_tags(id, None, &element)?;
        self.mutate_local(id, OperationKind::Remove, None, Some(element), observed)
    }

    pub fn set(&mut self, id: &str, value: Payload) -> Result<Operation> {
        self.mutate_local(id, OperationKind::Set, None, Some(value), Vec::new())
    }

    /// Increment the counter stored under `key` of map `id`
    pub fn map_increment(
        &mut self,
        id: &str,
        key: &str,
        nested_type: CrdtType,
        amount: u64,
    ) -> Result<Operation> {
        let amount = amount_payload(amount)?;
        self.mutate_local(
            id,
            OperationKind::Increment,
            Some((key, nested_type)),
            Some(amount),
            Vec::new(),
        )
    }

    /// Decrement the PN-Counter stored under `key` of map `id`
    pub fn map_decrement(&mut self, id: &str, key: &str, amount: u64) -> Result<Operation> {
        let amount = amount_payload(amount)?;
        self.mutate_local(
            id,
            OperationKind::Decrement,
            Some((key, CrdtType::PnCounter)),
            Some(amount),
            Vec::new(),
        )
    }

    /// Add to the OR-Set stored under `key` of map `id`
    pub fn map_add(&mut self, id: &str, key: &str, element: Payload) -> Result<Operation> {
        self.mutate_local(
            id,
            OperationKind::Add,
            Some((key, CrdtType::OrSet)),
            Some(element),
            Vec::new(),
        )
    }

    /// Remove from the OR-Set stored under `key` of map `id`
    pub fn map_remove(&mut self, id: &str, key: &str, element: Payload) -> Result<Operation> {
        let observed = self.observed_tags(id, Some(key), &element)?;
        self.mutate_local(
            id,
            OperationKind::Remove,
            Some((key, CrdtType::OrSet)),
            Some(element),
            observed,
        )
    }

    /// Write the register stored under `key` of map `id`
    pub fn map_set(
        &mut self,
        id: &str,
        key: &str,
        nested_type: CrdtType,
        value: Payload,
    ) -> Result<Operation> {
        self.mutate_local(
            id,
            OperationKind::Set,
            Some((key, nested_type)),
            Some(value),
            Vec::new(),
        )
    }

    fn observed_tags(&self, id: &str, key: Option<&str>, element: &Payload) -> Result<Vec<Dot>> {
        let crdt = self.crdts.get(id).ok_or_else(|| CrdtError::CrdtNotFound {
            id: id.to_string(),
        })?;
        let observed = crdt.live_tags(key, element);
        if observed.is_empty() {
            return Err(CrdtError::InvalidOperation(format!(
                "cannot remove {} from {}: element is not present",
                element, id
            )));
        }
        Ok(observed)
    }

    /// Stamp, apply and log a local mutation
    fn mutate_local(
        &mut self,
        id: &str,
        kind: OperationKind,
        entry: Option<(&str, CrdtType)>,
        value: Option<Payload>,
        observed: Vec<Dot>,
    ) -> Result<Operation> {
        let agent = self.agent_id().clone();
        let crdt = self.crdts.get(id).ok_or_else(|| CrdtError::CrdtNotFound {
            id: id.to_string(),
        })?;

        let mut clock = self.clock.copy();
        clock.increment(&agent);
        let mut op = Operation::new(kind, id, crdt.crdt_type(), clock, agent);
        if let Some((key, nested_type)) = entry {
            op = op.with_key(key, nested_type);
        }
        if let Some(value) = value {
            op = op.with_value(value);
        }
        op = op.with_observed(observed);
        crdt.validate_operation(&op)?;

        self.commit(&op)?;
        debug!(agent = %self.agent_id(), op = %op, "applied local operation");
        Ok(op)
    }

    /// Apply an operation to its CRDT, log it and advance the local clock
    fn commit(&mut self, op: &Operation) -> Result<()> {
        let crdt = self
            .crdts
            .get_mut(op.target_crdt_id())
            .ok_or_else(|| CrdtError::CrdtNotFound {
                id: op.target_crdt_id().to_string(),
            })?;
        crdt.apply(op)?;
        self.clock.merge(op.vector_clock());
        self.log.push(op.clone());
        self.listeners.emit(SyncEvent::OperationApplied {
            operation: op.clone(),
        });
        Ok(())
    }

    /// Apply an operation received from another replica
    ///
    /// Unknown CRDTs, variant mismatches and malformed operations are returned
    /// as errors (and reported as `ConflictDetected`) without touching any
    /// CRDT. A rejected operation still counts as delivered once its causal
    /// predecessors have arrived, so later operations from the same origin are
    /// not held back by it. Redeliveries are `Duplicate`; operations that
    /// arrived ahead of their predecessors are `Deferred`.
    pub fn apply_operation(&mut self, op: Operation) -> Result<ApplyOutcome> {
        let source = op.origin_agent_id().clone();
        let mut tally = Tally::default();
        self.deliver(op, &source, &mut tally)
    }

    fn deliver(
        &mut self,
        op: Operation,
        source: &AgentId,
        tally: &mut Tally,
    ) -> Result<ApplyOutcome> {
        match self.try_apply(&op, source) {
            Ok(ApplyOutcome::Applied) => {
                tally.applied += 1;
                self.release_pending(tally);
                Ok(ApplyOutcome::Applied)
            }
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                tally.conflicts += 1;
                self.settle_rejected(&op, source, tally);
                self.report_conflict(op, source, &err);
                Err(err)
            }
        }
    }

    /// Account for the dot of a rejected operation
    fn settle_rejected(&mut self, op: &Operation, source: &AgentId, tally: &mut Tally) {
        if self.mark_delivered(op) {
            self.release_pending(tally);
        } else if !self.is_redelivery(op) {
            self.defer(op, source, true);
        }
    }

    /// Advance the clock past `op` without applying it, if it is ready
    fn mark_delivered(&mut self, op: &Operation) -> bool {
        let origin = op.origin_agent_id();
        if self.is_redelivery(op) || !is_causally_ready(op.vector_clock(), &self.clock, origin) {
            return false;
        }
        self.clock.merge(op.vector_clock());
        debug!(agent = %self.agent_id(), op = %op, "skipped rejected operation");
        true
    }

    fn is_redelivery(&self, op: &Operation) -> bool {
        let origin = op.origin_agent_id();
        op.vector_clock().get(origin) <= self.clock.get(origin)
    }

    fn try_apply(&mut self, op: &Operation, source: &AgentId) -> Result<ApplyOutcome> {
        let crdt = self
            .crdts
            .get(op.target_crdt_id())
            .ok_or_else(|| CrdtError::CrdtNotFound {
                id: op.target_crdt_id().to_string(),
            })?;
        crdt.validate_operation(op)?;

        match op.vector_clock().compare(crdt.clock()) {
            ClockOrdering::Before | ClockOrdering::Equal => {
                trace!(op = %op, "dropping stale operation");
                return Ok(ApplyOutcome::Duplicate);
            }
            ClockOrdering::After | ClockOrdering::Concurrent => {}
        }

        if self.is_redelivery(op) {
            trace!(op = %op, "dropping redelivered operation");
            return Ok(ApplyOutcome::Duplicate);
        }
        if !is_causally_ready(op.vector_clock(), &self.clock, op.origin_agent_id()) {
            self.defer(op, source, false);
            return Ok(ApplyOutcome::Deferred);
        }

        self.commit(op)?;
        debug!(agent = %self.agent_id(), op = %op, "applied remote operation");
        Ok(ApplyOutcome::Applied)
    }

    fn defer(&mut self, op: &Operation, source: &AgentId, rejected: bool) {
        if let Some(existing) = self.pending.iter_mut().find(|p| p.operation.id() == op.id()) {
            existing.rejected &= rejected;
            return;
        }
        if self.pending.len() >= self.config.max_pending_operations {
            if let Some(evicted) = self.pending.pop_front() {
                warn!(
                    agent = %self.agent_id(),
                    op = %evicted.operation,
                    "causal buffer full, evicting oldest pending operation"
                );
            }
        }
        debug!(agent = %self.agent_id(), op = %op, "deferring operation until predecessors arrive");
        self.pending.push_back(PendingOperation {
            operation: op.clone(),
            source: source.clone(),
            rejected,
        });
    }

    /// Deliver buffered operations until none is ready
    fn release_pending(&mut self, tally: &mut Tally) {
        loop {
            let clock = &self.clock;
            let position = self.pending.iter().position(|p| {
                let origin = p.operation.origin_agent_id();
                let counter = p.operation.vector_clock().get(origin);
                counter <= clock.get(origin)
                    || is_causally_ready(p.operation.vector_clock(), clock, origin)
            });
            let Some(pending) = position.and_then(|i| self.pending.remove(i)) else {
                break;
            };
            if pending.rejected {
                self.mark_delivered(&pending.operation);
                continue;
            }
            match self.try_apply(&pending.operation, &pending.source) {
                Ok(ApplyOutcome::Applied) => tally.applied += 1,
                Ok(_) => {}
                Err(err) => {
                    tally.conflicts += 1;
                    self.mark_delivered(&pending.operation);
                    self.report_conflict(pending.operation, &pending.source, &err);
                }
            }
        }
    }

    fn report_conflict(&self, operation: Operation, remote_agent: &AgentId, err: &CrdtError) {
        warn!(
            agent = %self.agent_id(),
            remote = %remote_agent,
            op = %operation,
            caller_error = err.is_caller_error(),
            "rejected operation: {}",
            err
        );
        self.listeners.emit(SyncEvent::ConflictDetected {
            operation,
            remote_agent: remote_agent.clone(),
            reason: err.to_string(),
        });
    }

    /// Logged operations the holder of `state_vector` has not seen
    pub fn operations_since(&self, state_vector: &VectorClock) -> Vec<Operation> {
        self.log
            .iter()
            .filter(|op| {
                matches!(
                    op.vector_clock().compare(state_vector),
                    ClockOrdering::After | ClockOrdering::Concurrent
                )
            })
            .cloned()
            .collect()
    }

    /// One synchronization round with `remote_agent`
    ///
    /// The returned delta is computed before the remote operations are
    /// applied. Each remote operation is applied independently; rejections are
    /// counted as conflicts and never abort the round.
    pub fn synchronize_with(
        &mut self,
        remote_agent: &AgentId,
        remote_operations: Vec<Operation>,
        remote_state_vector: &VectorClock,
    ) -> Result<SyncResult> {
        if remote_agent == self.agent_id() {
            return Err(CrdtError::InvalidOperation(format!(
                "agent {} cannot synchronize with itself",
                remote_agent
            )));
        }
        let started = Instant::now();

        let delta = self.operations_since(remote_state_vector);
        let full_state_required = !self.log_floor.is_covered_by(remote_state_vector);
        if full_state_required {
            warn!(
                agent = %self.agent_id(),
                remote = %remote_agent,
                "delta incomplete for remote, full state transfer required"
            );
        }

        let mut tally = Tally::default();
        for op in remote_operations {
            // failures are tallied and reported inside deliver
            let _ = self.deliver(op, remote_agent, &mut tally);
        }

        let pending_from_peer = self
            .pending
            .iter()
            .filter(|p| !p.rejected && &p.source == remote_agent)
            .count();
        self.sync_states.insert(
            remote_agent.clone(),
            SyncState {
                last_sync_vector: remote_state_vector.copy(),
                pending_operations: pending_from_peer,
                conflict_count: tally.conflicts,
                merge_count: tally.applied,
                last_sync_time: Utc::now(),
            },
        );

        let sync_time_ms = started.elapsed().as_millis() as u64;
        info!(
            agent = %self.agent_id(),
            remote = %remote_agent,
            applied = tally.applied,
            conflicts = tally.conflicts,
            deferred = pending_from_peer,
            delta = delta.len(),
            "synchronization completed"
        );
        self.listeners.emit(SyncEvent::SyncCompleted {
            remote_agent: remote_agent.clone(),
            applied_operations: tally.applied,
            conflicts: tally.conflicts,
            sync_time_ms,
        });

        Ok(SyncResult {
            success: tally.conflicts == 0,
            applied_operations: tally.applied,
            conflicts: tally.conflicts,
            deferred_operations: pending_from_peer,
            delta,
            full_state_required,
            sync_time_ms,
        })
    }

    /// Drop log entries strictly older than `older_than`
    ///
    /// Under [`GcPolicy::Safe`] an entry is kept until every known peer has
    /// reported a state vector covering it; with no known peers nothing is
    /// acknowledged. Under [`GcPolicy::AgeOnly`] age alone decides, and peers
    /// that fall behind the compacted history are told to request a
    /// [`StateSnapshot`]. Returns the number of entries removed.
    pub fn garbage_collect(&mut self, older_than: Timestamp) -> usize {
        let policy = self.config.gc_policy;
        let peer_vectors: Vec<&VectorClock> = self
            .sync_states
            .values()
            .map(|state| &state.last_sync_vector)
            .collect();
        let floor = &mut self.log_floor;
        let before = self.log.len();

        self.log.retain(|op| {
            if op.timestamp() >= older_than {
                return true;
            }
            let acknowledged = match policy {
                GcPolicy::AgeOnly => true,
                GcPolicy::Safe => {
                    !peer_vectors.is_empty()
                        && peer_vectors
                            .iter()
                            .all(|vector| op.vector_clock().is_covered_by(vector))
                }
            };
            if acknowledged {
                floor.merge(op.vector_clock());
            }
            !acknowledged
        });

        let removed = before - self.log.len();
        info!(
            agent = %self.agent_id(),
            removed,
            remaining = self.log.len(),
            policy = ?policy,
            "garbage collected operation log"
        );
        removed
    }

    /// Garbage collect entries older than the configured retention
    pub fn garbage_collect_expired(&mut self) -> usize {
        let retention = self.config.retention.as_millis() as u64;
        self.garbage_collect(Timestamp::now().saturating_sub_millis(retention))
    }

    /// Full local state, for peers whose delta history was compacted away
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            agent_id: self.agent_id().clone(),
            state_vector: self.clock.copy(),
            crdts: self.crdts.clone(),
        }
    }

    /// Merge a peer's full state
    ///
    /// Every CRDT is merged state-based; unknown ones are adopted. The local
    /// clock then covers the peer's history, which is not available as log
    /// entries and so raises the log floor.
    pub fn merge_snapshot(&mut self, snapshot: &StateSnapshot) -> Result<SnapshotReport> {
        let mut report = SnapshotReport::default();
        for (id, remote) in &snapshot.crdts {
            match self.crdts.get(id) {
                Some(local) => match local.merge(remote) {
                    Ok(merged) => {
                        self.crdts.insert(id.clone(), merged);
                        report.merged += 1;
                    }
                    Err(err) => {
                        warn!(
                            agent = %self.agent_id(),
                            remote = %snapshot.agent_id,
                            crdt = %id,
                            "snapshot entry rejected: {}",
                            err
                        );
                        report.rejected.push(id.clone());
                    }
                },
                None => {
                    let adopted = remote.adopt(self.agent_id().clone());
                    self.crdts.insert(id.clone(), adopted.clone());
                    report.adopted += 1;
                    self.listeners.emit(SyncEvent::CrdtCreated {
                        id: id.clone(),
                        crdt_type: adopted.crdt_type(),
                        crdt: adopted,
                    });
                }
            }
        }

        self.clock.merge(&snapshot.state_vector);
        self.log_floor.merge(&snapshot.state_vector);

        let mut tally = Tally::default();
        self.release_pending(&mut tally);
        report.released_operations = tally.applied;

        info!(
            agent = %self.agent_id(),
            remote = %snapshot.agent_id,
            merged = report.merged,
            adopted = report.adopted,
            rejected = report.rejected.len(),
            "merged state snapshot"
        );
        Ok(report)
    }

    /// Aggregate per-peer counters
    pub fn sync_stats(&self) -> SyncStats {
        let total_merges: usize = self.sync_states.values().map(|s| s.merge_count).sum();
        let total_conflicts: usize = self.sync_states.values().map(|s| s.conflict_count).sum();
        let exchanged = total_merges + total_conflicts;
        SyncStats {
            total_peers: self.sync_states.len(),
            total_merges,
            total_conflicts,
            conflict_rate: if exchanged == 0 {
                0.0
            } else {
                total_conflicts as f64 / exchanged as f64
            },
            operation_log_len: self.log.len(),
            crdt_count: self.crdts.len(),
            pending_operations: self.pending.len(),
        }
    }
}

#[async_trait]
impl ConsistencyStrategy for CrdtSynchronizer {
    fn strategy_name(&self) -> &'static str {
        "crdt"
    }

    async fn synchronize(
        &mut self,
        remote_agent: &AgentId,
        remote_operations: Vec<Operation>,
        remote_state_vector: &VectorClock,
    ) -> Result<SyncResult> {
        self.synchronize_with(remote_agent, remote_operations, remote_state_vector)
    }

    /// CRDTs converge without voting
    fn has_quorum(&self) -> bool {
        true
    }

    fn min_quorum(&self) -> usize {
        1
    }

    fn stats(&self) -> SyncStats {
        self.sync_stats()
    }
}

fn amount_payload(amount: u64) -> Result<Payload> {
    match i64::try_from(amount) {
        Ok(n) if n > 0 => Ok(Payload::Int(n)),
        _ => Err(CrdtError::InvalidOperation(format!(
            "counter amount must be between 1 and {}, got {}",
            i64::MAX,
            amount
        ))),
    }
}

/// Local writes that establish an initial value
fn seed_operations(
    crdt_type: CrdtType,
    initial_value: Option<Payload>,
) -> Result<Vec<(OperationKind, Payload)>> {
    let Some(value) = initial_value else {
        return Ok(Vec::new());
    };
    let invalid = |value: &Payload| {
        CrdtError::InvalidOperation(format!(
            "{} is not a valid initial value for {}",
            value, crdt_type
        ))
    };
    let seed = match (crdt_type, value) {
        (CrdtType::GCounter | CrdtType::PnCounter, Payload::Int(0)) => Vec::new(),
        (CrdtType::GCounter | CrdtType::PnCounter, Payload::Int(n)) if n > 0 => {
            vec![(OperationKind::Increment, Payload::Int(n))]
        }
        (CrdtType::PnCounter, Payload::Int(n)) => {
            let magnitude = n.checked_neg().ok_or_else(|| invalid(&Payload::Int(n)))?;
            vec![(OperationKind::Decrement, Payload::Int(magnitude))]
        }
        (CrdtType::OrSet, Payload::List(items)) => items
            .into_iter()
            .map(|item| (OperationKind::Add, item))
            .collect(),
        (CrdtType::OrSet, element) => vec![(OperationKind::Add, element)],
        (CrdtType::LwwRegister | CrdtType::MvRegister, value) => {
            vec![(OperationKind::Set, value)]
        }
        (_, value) => return Err(invalid(&value)),
    };
    Ok(seed)
}
