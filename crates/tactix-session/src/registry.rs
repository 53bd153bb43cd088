//! The connection registry: durable user identity → live connection.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is not thread-safe by itself — it's a plain
//! `HashMap` owned behind a `tokio::sync::Mutex` at the server layer.
//! Every method is non-blocking; the only side effect is queueing a
//! close signal on a superseded handle's channel.

use std::collections::HashMap;

use tactix_protocol::UserId;
use tactix_transport::ConnectionId;

use crate::ConnectionHandle;

/// Maps each connected user to their single live connection.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<UserId, ConnectionHandle>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Registers a handle for its user, superseding any previous one.
    ///
    /// The old handle (if any) is told to close and returned so the
    /// caller can run its disconnect cleanup; once replaced it can no
    /// longer act for the user, because [`remove`](Self::remove) is
    /// conditional on the connection ID.
    pub fn register(&mut self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let user_id = handle.user_id().clone();
        let previous = self.connections.insert(user_id.clone(), handle);
        match previous {
            Some(old) => {
                tracing::info!(
                    %user_id,
                    old_conn = %old.conn_id(),
                    "superseding existing connection for user"
                );
                old.close();
                Some(old)
            }
            None => {
                tracing::debug!(%user_id, "connection registered");
                None
            }
        }
    }

    /// Looks up the live connection for a user, if any.
    pub fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        self.connections.get(user_id).cloned()
    }

    /// Removes the user's entry, but only if it still belongs to the
    /// given connection. A stale handle's deferred cleanup therefore
    /// never evicts the replacement that superseded it.
    pub fn remove(&mut self, user_id: &UserId, conn_id: ConnectionId) -> bool {
        match self.connections.get(user_id) {
            Some(current) if current.conn_id() == conn_id => {
                self.connections.remove(user_id);
                tracing::debug!(%user_id, %conn_id, "connection removed");
                true
            }
            _ => false,
        }
    }

    /// Snapshot of all registered handles, for the liveness sweep.
    pub fn handles(&self) -> Vec<ConnectionHandle> {
        self.connections.values().cloned().collect()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
