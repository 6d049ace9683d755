//! Events emitted by the synchronizer
//!
//! Listeners are registered when the synchronizer is built and are called
//! synchronously, in registration order, after the state change they describe.

use crate::{
    crdt::{Crdt, CrdtType},
    operation::Operation,
    types::AgentId,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Observable state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    CrdtCreated {
        id: String,
        crdt_type: CrdtType,
        crdt: Crdt,
    },
    OperationApplied {
        operation: Operation,
    },
    ConflictDetected {
        operation: Operation,
        remote_agent: AgentId,
        reason: String,
    },
    SyncCompleted {
        remote_agent: AgentId,
        applied_operations: usize,
        conflicts: usize,
        sync_time_ms: u64,
    },
}

impl SyncEvent {
    /// Event name as used on telemetry channels
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::CrdtCreated { .. } => "crdt_created",
            SyncEvent::OperationApplied { .. } => "operation_applied",
            SyncEvent::ConflictDetected { .. } => "conflict_detected",
            SyncEvent::SyncCompleted { .. } => "sync_completed",
        }
    }
}

/// Receiver of synchronizer events
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &SyncEvent);
}

impl<F> EventListener for F
where
    F: Fn(&SyncEvent) + Send + Sync,
{
    fn on_event(&self, event: &SyncEvent) {
        self(event)
    }
}

/// Listener that keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().clone()
    }

    /// Names of the recorded events, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(SyncEvent::name).collect()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<SyncEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventListener for RecordingListener {
    fn on_event(&self, event: &SyncEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Listener that forwards events to an async consumer
///
/// A closed receiver is ignored; the synchronizer never blocks on telemetry.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelListener {
    /// Listener paired with the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventListener for ChannelListener {
    fn on_event(&self, event: &SyncEvent) {
        let _ = self.sender.send(event.clone());
    }
}

/// Ordered set of listeners owned by one synchronizer
#[derive(Default, Clone)]
pub struct Listeners {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl Listeners {
    pub fn push(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: SyncEvent) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(applied: usize) -> SyncEvent {
        SyncEvent::SyncCompleted {
            remote_agent: AgentId::new("a2"),
            applied_operations: applied,
            conflicts: 0,
            sync_time_ms: 0,
        }
    }

    #[test]
    fn test_listeners_called_in_order() {
        let recorder = RecordingListener::new();
        let mut listeners = Listeners::default();
        listeners.push(Arc::new(recorder.clone()));

        listeners.emit(completed(1));
        listeners.emit(completed(2));

        assert_eq!(recorder.names(), vec!["sync_completed", "sync_completed"]);
        assert_eq!(recorder.drain(), vec![completed(1), completed(2)]);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_closure_listener() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        let mut listeners = Listeners::default();
        listeners.push(Arc::new(move |_: &SyncEvent| *counter.lock() += 1));

        listeners.emit(completed(0));
        assert_eq!(*seen.lock(), 1);
    }

    #[tokio::test]
    async fn test_channel_listener_forwards() {
        let (listener, mut receiver) = ChannelListener::channel();
        listener.on_event(&completed(3));
        assert_eq!(receiver.recv().await, Some(completed(3)));

        drop(receiver);
        // closed receiver must not panic
        let (listener, receiver) = ChannelListener::channel();
        drop(receiver);
        listener.on_event(&completed(4));
    }
}
