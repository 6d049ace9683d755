//! # AgentMesh CRDT
//!
//! Conflict-free replicated state for agents that talk to each other
//! asynchronously and may be partitioned for arbitrary periods.
//!
//! Every agent mutates its local replicas at any time, exchanges operation
//! history with any peer in any order, and converges to the same values once
//! all history has been exchanged. No coordinator, no locks, no rejected writes
//! during a partition.
//!
//! ## Supported CRDTs
//!
//! - **G-Counter**: grow-only counter
//! - **PN-Counter**: increment/decrement counter
//! - **OR-Set**: observed-remove set, concurrent add wins
//! - **LWW-Register**: last-writer-wins register with deterministic tie-break
//! - **MV-Register**: multi-value register exposing concurrent writes
//! - **Map**: string keys to nested CRDTs
//!
//! ## Synchronization
//!
//! [`CrdtSynchronizer`] owns an agent's replicas, its operation log and one
//! [`SyncState`] per peer. Causality is tracked with [`VectorClock`]s; stale and
//! duplicate operations are dropped, early ones are buffered until their
//! predecessors arrive.
//!
//! ## Example
//!
//! ```rust
//! use agentmesh_crdt::{CrdtSynchronizer, CrdtType, SynchronizerConfig, Value};
//!
//! # fn main() -> agentmesh_crdt::Result<()> {
//! let mut a1 = CrdtSynchronizer::new(SynchronizerConfig::new("a1"))?;
//! let mut a2 = CrdtSynchronizer::new(SynchronizerConfig::new("a2"))?;
//! a1.create_crdt("hits", CrdtType::GCounter, None)?;
//! a2.create_crdt("hits", CrdtType::GCounter, None)?;
//!
//! a1.increment("hits", 5)?;
//! a2.increment("hits", 3)?;
//!
//! let to_a2 = a1.operations_since(a2.state_vector());
//! let a1_id = a1.agent_id().clone();
//! let a1_vector = a1.state_vector().clone();
//! let reply = a2.synchronize_with(&a1_id, to_a2, &a1_vector)?;
//! let a2_id = a2.agent_id().clone();
//! let a2_vector = a2.state_vector().clone();
//! a1.synchronize_with(&a2_id, reply.delta, &a2_vector)?;
//!
//! assert_eq!(a1.value("hits"), Some(Value::Count(8)));
//! assert_eq!(a2.value("hits"), Some(Value::Count(8)));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod traits;
pub mod types;

// CRDT implementations
pub mod g_counter;
pub mod lww_register;
pub mod map;
pub mod mv_register;
pub mod or_set;
pub mod pn_counter;

pub mod crdt;

// Utilities
pub mod clock;
pub mod config;
pub mod events;
pub mod operation;
pub mod sync;
pub mod synchronizer;
pub mod wire;

// Re-exports for convenience
pub use clock::{ClockOrdering, VectorClock};
pub use config::{GcPolicy, SynchronizerConfig};
pub use crdt::{Crdt, CrdtState, CrdtType, Metadata, Value};
pub use error::{CrdtError, Result};
pub use events::{ChannelListener, EventListener, RecordingListener, SyncEvent};
pub use operation::{Operation, OperationKind};
pub use sync::{ApplyOutcome, SnapshotReport, StateSnapshot, SyncResult, SyncState, SyncStats};
pub use synchronizer::CrdtSynchronizer;
pub use traits::{ConsistencyStrategy, Mergeable};
pub use types::{AgentId, Dot, Payload, Timestamp};

pub use g_counter::GCounter;
pub use lww_register::LwwRegister;
pub use map::CrdtMap;
pub use mv_register::MvRegister;
pub use or_set::OrSet;
pub use pn_counter::PnCounter;
