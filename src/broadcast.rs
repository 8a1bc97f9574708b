//! Fan-out of change events to live client connections.
//!
//! The connection set is owned by a [`Broadcaster`] handle that is created
//! once and injected wherever it is needed (router state, event pump). Each
//! connection is a bounded queue; `publish` never waits on a client. A
//! connection whose queue is closed or full is dropped from the set.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::ChangeEvent;

/// Serialized event payload, shared by every connection.
pub type Payload = Arc<str>;

/// Identifier for a registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Inner {
    connections: Mutex<HashMap<ConnectionId, mpsc::Sender<Payload>>>,
    next_id: AtomicU64,
    buffer: usize,
}

/// Manages the live connection set and broadcasts events to it
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

impl Broadcaster {
    /// Create a broadcaster whose subscriptions queue up to `buffer` payloads
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                connections: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Add a connection's outbound queue to the live set
    pub fn register(&self, sender: mpsc::Sender<Payload>) -> ConnectionId {
        let id = ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let count = {
            let mut connections = self.inner.connections.lock();
            connections.insert(id, sender);
            connections.len()
        };
        crate::debug_event!("broadcast", "registered", "{id} ({count} live)");
        id
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.inner.connections.lock().remove(&id).is_some();
        if removed {
            crate::debug_event!("broadcast", "unregistered", "{id}");
        }
        removed
    }

    /// Register a new connection with a fresh queue.
    ///
    /// The returned [`Subscription`] unregisters itself when dropped.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let id = self.register(tx);
        Subscription {
            id,
            receiver: rx,
            broadcaster: self.clone(),
        }
    }

    /// Serialize `event` once and queue it on every live connection.
    ///
    /// Connections whose queue is closed or full are unregistered; the
    /// remaining connections still receive the event. Returns the number of
    /// connections the event was queued on.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let payload: Payload = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!("[broadcast] failed to serialize {event:?}: {e}");
                return 0;
            }
        };
        self.publish_payload(payload)
    }

    fn publish_payload(&self, payload: Payload) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        let mut connections = self.inner.connections.lock();
        for (id, sender) in connections.iter() {
            match sender.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!("[broadcast] {id} is not keeping up, disconnecting");
                    dead.push(*id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
            }
        }
        for id in &dead {
            connections.remove(id);
        }
        drop(connections);

        if !dead.is_empty() {
            crate::debug_event!("broadcast", "pruned", "{} dead connections", dead.len());
        }
        crate::debug_event!("broadcast", "sent", "{payload} to {delivered} connections");
        delivered
    }

    /// Number of currently registered connections
    pub fn connection_count(&self) -> usize {
        self.inner.connections.lock().len()
    }

    /// Drop every connection. Pending `recv` calls return `None`.
    pub fn close_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.inner.connections.lock());
        if !drained.is_empty() {
            crate::debug_event!("broadcast", "closed", "{} connections", drained.len());
        }
        drained.len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A registered connection's receiving end.
pub struct Subscription {
    id: ConnectionId,
    receiver: mpsc::Receiver<Payload>,
    broadcaster: Broadcaster,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Wait for the next payload.
    ///
    /// Returns `None` once the broadcaster has dropped this connection.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.receiver.recv().await
    }

    /// Non-blocking receive, for draining.
    pub fn try_recv(&mut self) -> Option<Payload> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unregister(self.id);
    }
}

/// Forward events from the watcher channel to the broadcaster, in order.
///
/// The task ends when every sender of `events` has been dropped.
pub fn spawn_pump(mut events: mpsc::Receiver<ChangeEvent>, broadcaster: Broadcaster) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let delivered = broadcaster.publish(&event);
            crate::log_event!("broadcast", event.kind(), "{} -> {delivered} clients", event.path());
        }
        crate::debug_event!("broadcast", "pump stopped");
    })
}
