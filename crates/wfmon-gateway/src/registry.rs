//! Live viewer connections and failure-isolated fan-out.
//!
//! The registry only holds handles. Tearing down a transport is the
//! connection's job; the registry triggers it through [`Connection::close`]
//! when a send fails.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::DeliveryError;

pub type ConnectionId = u64;

/// Handle to one live viewer endpoint.
///
/// `send` must not block: implementations enqueue and return.
pub trait Connection: Send + Sync {
    fn id(&self) -> ConnectionId;

    fn send(&self, text: &str) -> Result<(), DeliveryError>;

    /// Ask the transport to shut down. Must be idempotent.
    fn close(&self) {}
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<ConnectionId>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    live: Mutex<HashMap<ConnectionId, Arc<dyn Connection>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh connection id.
    pub fn next_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    // Critical sections never await, and a panic while holding the lock
    // cannot leave the map half-updated.
    fn live(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<dyn Connection>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection to the live set. Re-registering an id replaces it.
    pub fn register(&self, conn: Arc<dyn Connection>) {
        let id = conn.id();
        let count = {
            let mut live = self.live();
            live.insert(id, conn);
            live.len()
        };
        tracing::debug!(conn_id = id, connections = count, "viewer registered");
    }

    /// Remove a connection if present. Returns whether it was present.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let (removed, count) = {
            let mut live = self.live();
            let removed = live.remove(&id).is_some();
            (removed, live.len())
        };
        if removed {
            tracing::debug!(conn_id = id, connections = count, "viewer unregistered");
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.live().len()
    }

    /// Deliver `text` to every connection live when the call starts.
    ///
    /// Sends run against a snapshot of the live set. Failures are collected
    /// and reaped after the pass; one failing viewer never stops the rest.
    pub fn broadcast(&self, text: &str) -> BroadcastReport {
        let targets: Vec<Arc<dyn Connection>> = self.live().values().cloned().collect();

        let mut report = BroadcastReport::default();
        let mut dead = Vec::new();
        for conn in targets {
            match conn.send(text) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::debug!(conn_id = conn.id(), error = %e, "broadcast send failed");
                    report.failed.push(conn.id());
                    dead.push(conn);
                }
            }
        }

        for conn in dead {
            self.unregister(conn.id());
            conn.close();
        }
        report
    }

    /// Send to one connection with the same failure contract as a broadcast leg.
    pub fn send_direct(&self, conn: &Arc<dyn Connection>, text: &str) -> Result<(), DeliveryError> {
        conn.send(text).inspect_err(|e| {
            tracing::debug!(conn_id = conn.id(), error = %e, "direct send failed");
            self.unregister(conn.id());
            conn.close();
        })
    }

    /// Close and forget every connection. Used at shutdown.
    pub fn close_all(&self) {
        let drained: Vec<Arc<dyn Connection>> = self.live().drain().map(|(_, c)| c).collect();
        if !drained.is_empty() {
            tracing::info!(connections = drained.len(), "closing all viewers");
        }
        for conn in drained {
            conn.close();
        }
    }
}

/// Keeps a connection registered for as long as it lives.
///
/// Dropping the guard unregisters, so every exit path of a subscription
/// loop releases its slot.
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Registration {
    pub fn new(registry: Arc<ConnectionRegistry>, id: ConnectionId) -> Self {
        Self { registry, id }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}
