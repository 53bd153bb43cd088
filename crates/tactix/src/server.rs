//! `TactixServer` builder and server loop.
//!
//! This is the entry point for running a Tactix server. It ties
//! together all the layers: transport → protocol → session → lobby →
//! room, and drives the four background sweeps (heartbeat, invite
//! expiry, matchmaking, idle rooms).

use std::sync::Arc;

use tactix_lobby::{InviteBook, MatchQueue};
use tactix_protocol::JsonCodec;
use tactix_room::RoomManager;
use tactix_session::{Authenticator, ConnectionRegistry};
use tactix_sweep::{spawn_sweeper, SweepConfig};
use tactix_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::{disconnect_cleanup, handle_connection};
use crate::{ServerConfig, TactixError};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Each
/// component sits behind its own `Mutex`; locks are taken one at a
/// time, never nested, and never held across network I/O — handlers
/// only queue messages on connection handles.
pub(crate) struct ServerState<A: Authenticator> {
    pub(crate) config: ServerConfig,
    pub(crate) registry: Mutex<ConnectionRegistry>,
    pub(crate) invites: Mutex<InviteBook>,
    pub(crate) queue: Mutex<MatchQueue>,
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) auth: A,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Tactix server.
///
/// # Example
///
/// ```rust,ignore
/// let server = TactixServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_auth)
///     .await?;
/// server.run().await
/// ```
pub struct TactixServerBuilder {
    config: ServerConfig,
}

impl TactixServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the server with the given authenticator, binding the
    /// listener. Uses `JsonCodec` over WebSocket.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<TactixServer<A>, TactixError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(ConnectionRegistry::new()),
            invites: Mutex::new(InviteBook::new(self.config.invite_ttl)),
            queue: Mutex::new(MatchQueue::new(self.config.pairing)),
            rooms: Mutex::new(RoomManager::new(self.config.room_idle_timeout)),
            auth,
            codec: JsonCodec,
            config: self.config,
        });

        Ok(TactixServer { transport, state })
    }
}

impl Default for TactixServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Tactix server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TactixServer<A: Authenticator> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A>>,
}

impl<A: Authenticator> TactixServer<A> {
    /// Creates a new builder.
    pub fn builder() -> TactixServerBuilder {
        TactixServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server: starts the background sweeps, then accepts
    /// connections until the process is terminated.
    pub async fn run(mut self) -> Result<(), TactixError> {
        spawn_sweeps(&self.state);
        tracing::info!("Tactix server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Starts the four maintenance tasks. Each owns a clone of the shared
/// state and runs until the runtime shuts down.
fn spawn_sweeps<A: Authenticator>(state: &Arc<ServerState<A>>) {
    let cfg = &state.config;

    // Heartbeat: confirm-or-suspect every connection. A handle whose
    // suspect flag was never confirmed since the previous pass is dead.
    let s = Arc::clone(state);
    spawn_sweeper(
        "heartbeat",
        SweepConfig::every(cfg.heartbeat_interval),
        move || {
            let s = Arc::clone(&s);
            async move {
                let handles = s.registry.lock().await.handles();
                for handle in handles {
                    if handle.is_alive() {
                        handle.suspect();
                        handle.ping();
                    } else {
                        tracing::info!(
                            user_id = %handle.user_id(),
                            conn_id = %handle.conn_id(),
                            "connection missed heartbeat, disconnecting"
                        );
                        handle.close();
                        if handle.begin_cleanup() {
                            disconnect_cleanup(&s, &handle).await;
                        }
                    }
                }
            }
        },
    );

    // Invite expiry.
    let s = Arc::clone(state);
    spawn_sweeper(
        "invites",
        SweepConfig::every(cfg.invite_sweep_interval),
        move || {
            let s = Arc::clone(&s);
            async move {
                let dropped = s.invites.lock().await.sweep();
                if dropped > 0 {
                    tracing::debug!(dropped, "invites garbage-collected");
                }
            }
        },
    );

    // Matchmaking pairing pass.
    let s = Arc::clone(state);
    spawn_sweeper(
        "matchmaking",
        SweepConfig::every(cfg.match_interval),
        move || {
            let s = Arc::clone(&s);
            async move {
                let pairs = s.queue.lock().await.pair();
                if pairs.is_empty() {
                    return;
                }
                let mut rooms = s.rooms.lock().await;
                for pair in pairs {
                    if let Err(e) = rooms.create_matched(pair.x.clone(), pair.o.clone()) {
                        // One of the pair slipped into a room between the
                        // pairing pass and room creation.
                        tracing::warn!(error = %e, "matched pair could not be seated");
                        for handle in [&pair.x, &pair.o] {
                            handle.send(tactix_protocol::ServerMessage::Error {
                                message: "Match could not be created, please rejoin the queue"
                                    .to_string(),
                            });
                        }
                    }
                }
            }
        },
    );

    // Idle room reaping.
    let s = Arc::clone(state);
    spawn_sweeper(
        "rooms",
        SweepConfig::every(cfg.room_sweep_interval),
        move || {
            let s = Arc::clone(&s);
            async move {
                let reaped = s.rooms.lock().await.reap_idle();
                if reaped > 0 {
                    tracing::info!(reaped, "idle rooms reaped");
                }
            }
        },
    );
}
