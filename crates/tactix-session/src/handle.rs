//! The shared handle components hold for a live connection.
//!
//! A [`ConnectionHandle`] is the cheap-to-clone face of one WebSocket:
//! the registry, the matchmaking queue, room seats, and the liveness
//! monitor all hold clones, while the socket itself stays owned by
//! the connection's handler task. Everything a component does to a
//! connection goes through the handle's typed outbound channel.

use std::sync::Mutex as StdMutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tactix_protocol::{ServerMessage, UserId};
use tactix_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::Identity;

/// An event queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// A protocol message to serialize and send.
    Message(ServerMessage),
    /// A liveness ping frame.
    Ping,
    /// Close the socket (replacement, liveness death, shutdown).
    Close,
}

struct HandleInner {
    conn_id: ConnectionId,
    identity: Identity,
    outbound: mpsc::UnboundedSender<Outbound>,
    /// Liveness flag: cleared by the monitor each sweep, set again on
    /// pong. Two consecutive sweeps without a pong mean dead.
    alive: AtomicBool,
    last_pong: StdMutex<Instant>,
    /// Latch ensuring disconnect cleanup runs exactly once, no matter
    /// how many paths (read loop exit, liveness monitor, replacement)
    /// race to trigger it.
    cleaned: AtomicBool,
}

/// Cheap-to-clone handle for one authenticated connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

impl ConnectionHandle {
    /// Creates a handle and the receiving end of its outbound channel.
    ///
    /// The receiver belongs to the connection's writer task; the
    /// channel is unbounded so no component ever blocks on a slow
    /// peer (a backed-up socket is detected by the liveness monitor,
    /// not by a stalled send).
    pub fn new(
        conn_id: ConnectionId,
        identity: Identity,
    ) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            inner: Arc::new(HandleInner {
                conn_id,
                identity,
                outbound: tx,
                alive: AtomicBool::new(true),
                last_pong: StdMutex::new(Instant::now()),
                cleaned: AtomicBool::new(false),
            }),
        };
        (handle, rx)
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.inner.conn_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.inner.identity.user_id
    }

    pub fn username(&self) -> &str {
        &self.inner.identity.username
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    /// Queues a message, best-effort. A closed channel (writer task
    /// already gone) is silently dropped — the liveness monitor is
    /// the single authority on dead connections.
    pub fn send(&self, msg: ServerMessage) {
        let _ = self.inner.outbound.send(Outbound::Message(msg));
    }

    /// Queues a liveness ping.
    pub fn ping(&self) {
        let _ = self.inner.outbound.send(Outbound::Ping);
    }

    /// Asks the writer task to close the socket.
    pub fn close(&self) {
        let _ = self.inner.outbound.send(Outbound::Close);
    }

    /// Whether a pong arrived since the last [`suspect`](Self::suspect).
    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::Acquire)
    }

    /// Clears the liveness flag. Called by the monitor before pinging.
    pub fn suspect(&self) {
        self.inner.alive.store(false, Ordering::Release);
    }

    /// Confirms liveness and refreshes the last-pong timestamp.
    /// Called from the read loop on pong receipt.
    pub fn mark_alive(&self) {
        self.inner.alive.store(true, Ordering::Release);
        // The guard only ever wraps an Instant store; poisoning can't
        // leave it inconsistent, so recover instead of panicking.
        let mut guard = self
            .inner
            .last_pong
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *guard = Instant::now();
    }

    /// The instant of the most recent pong (or connect).
    pub fn last_pong(&self) -> Instant {
        *self
            .inner
            .last_pong
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Claims the cleanup latch. Returns `true` exactly once; every
    /// later caller gets `false` and must do nothing.
    pub fn begin_cleanup(&self) -> bool {
        !self.inner.cleaned.swap(true, Ordering::AcqRel)
    }

    /// Whether cleanup has begun. A handle past this point must never
    /// be seated in a room: its disconnect sweep has already run, so
    /// nothing would ever clean the seat up again.
    pub fn is_defunct(&self) -> bool {
        self.inner.cleaned.load(Ordering::Acquire)
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.conn_id == other.inner.conn_id
    }
}

impl Eq for ConnectionHandle {}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("conn_id", &self.inner.conn_id)
            .field("user_id", self.user_id())
            .finish()
    }
}
