//! # Lifecycle Events
//!
//! Every committed mutation produces exactly one [`LifecycleEvent`], which
//! the lifecycle service hands to an injectable [`EventSink`]. Rejected
//! operations produce nothing.
//!
//! Delivery is fire-and-forget: the core never depends on a sink
//! succeeding, so `emit` has no return value.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use cryptonia_core::{CredentialId, CredentialKind, Identity, Timestamp};

/// What happened to the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A credential was minted.
    Issued,
    /// A Passport was destroyed by its holder.
    Burned,
    /// A Visa was cancelled by the authority.
    Cancelled,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Issued => "ISSUED",
            Self::Burned => "BURNED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Audit record of one committed lifecycle mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Operation kind.
    pub kind: EventKind,
    /// Credential affected.
    pub id: CredentialId,
    /// Holder at the time of the mutation.
    pub holder: Identity,
    /// Credential variant.
    pub variant: CredentialKind,
    /// When the mutation was committed.
    pub timestamp: Timestamp,
}

/// Consumer of lifecycle events.
///
/// Called while the service holds its registry write lock, so events arrive
/// in commit order. Implementations must return promptly and must not call
/// back into the service.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: &LifecycleEvent);
}

/// Emits each event as a structured `tracing` record at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LifecycleEvent) {
        tracing::info!(
            target: "cryptonia::audit",
            kind = %event.kind,
            id = event.id.get(),
            holder = %event.holder,
            variant = %event.variant,
            timestamp = event.timestamp.epoch_secs(),
            "credential lifecycle event"
        );
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything emitted so far, in order.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    /// Drain and return everything emitted so far.
    pub fn take(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of events collected.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &LifecycleEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Pushes events onto an unbounded tokio channel.
///
/// A closed receiver is logged once per event at DEBUG and otherwise
/// ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LifecycleEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &LifecycleEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::debug!(id = event.id.get(), "event receiver closed; dropping event");
        }
    }
}
