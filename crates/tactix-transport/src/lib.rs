//! Transport abstraction layer for Tactix.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract
//! over the underlying network protocol, plus the client-side
//! [`ReconnectPolicy`] state machine.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod reconnect;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use reconnect::{ReconnectPolicy, ReconnectState, Reconnector};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport, connect_with_retry};

use std::fmt;

/// Opaque process-local identifier for a connection.
///
/// Distinct from the durable user identity: a user who reconnects gets
/// a fresh `ConnectionId`, which is what makes stale-handle cleanup
/// distinguishable from cleanup of the live replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An inbound event surfaced by [`Connection::recv`].
///
/// Pongs are surfaced (rather than swallowed) because the liveness
/// monitor's suspect-then-confirm scheme needs to observe them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A data frame (text or binary payload bytes).
    Data(Vec<u8>),
    /// The peer answered our ping.
    Pong,
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection that can send and receive frames.
///
/// Send and receive sides are independently locked: a pending `recv`
/// must never delay a `send` (the liveness monitor and room broadcasts
/// write while the read loop is parked waiting for the peer).
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a data frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends a protocol-level ping.
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Receives the next event from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Incoming>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
