//! Per-connection handler: auth gate, message routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive AUTHENTICATE → verify token → `ConnectionHandle`
//!   2. Register in the registry (superseding any earlier connection)
//!   3. Spawn the writer task draining the handle's outbound channel
//!   4. Loop: receive frames → decode → dispatch to components
//!   5. On exit, run disconnect cleanup exactly once
//!
//! Rejections are answered with an ERROR message to the offending
//! sender only; nothing a connection does wrong is ever broadcast.

use std::sync::Arc;

use tactix_protocol::{
    ClientMessage, Codec, InviteSender, JsonCodec, QueueStatus, ServerMessage,
};
use tactix_session::{Authenticator, ConnectionHandle, Identity, Outbound, SessionError};
use tactix_transport::{Connection, Incoming, WebSocketConnection};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::server::ServerState;
use crate::TactixError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A: Authenticator>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A>>,
) -> Result<(), TactixError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let identity = authenticate(&conn, &state).await?;
    tracing::info!(%conn_id, user_id = %identity.user_id, "user authenticated");

    let (handle, outbound_rx) = ConnectionHandle::new(conn_id, identity);

    // Register, superseding an earlier connection for the same user.
    // The superseded handle's cleanup runs here if it wins the latch;
    // its own handler task may still be parked in recv.
    let superseded = state.registry.lock().await.register(handle.clone());
    if let Some(old) = superseded {
        if old.begin_cleanup() {
            disconnect_cleanup(&state, &old).await;
        }
    }

    handle.send(ServerMessage::Authenticated {
        user_id: handle.user_id().clone(),
        username: handle.username().to_string(),
    });

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), outbound_rx, state.codec));

    read_loop(&conn, &state, &handle).await;

    if handle.begin_cleanup() {
        disconnect_cleanup(&state, &handle).await;
    }
    // Stops the writer once it has drained anything cleanup queued
    // (a forfeit GAME_OVER headed elsewhere never goes through us,
    // so this is just our own socket's close).
    handle.close();
    let _ = writer.await;
    Ok(())
}

/// Tears down everything a departed connection was involved in.
/// Callers must hold the handle's cleanup latch.
pub(crate) async fn disconnect_cleanup<A: Authenticator>(
    state: &Arc<ServerState<A>>,
    handle: &ConnectionHandle,
) {
    state
        .registry
        .lock()
        .await
        .remove(handle.user_id(), handle.conn_id());
    state.queue.lock().await.dequeue(handle.conn_id());
    state.rooms.lock().await.handle_disconnect(handle.conn_id());
    tracing::info!(
        user_id = %handle.user_id(),
        conn_id = %handle.conn_id(),
        "connection cleaned up"
    );
}

/// The auth gate: the first data frame must be a valid AUTHENTICATE.
///
/// Anything else — timeout, an unparseable frame, a different message
/// type — closes the socket with a policy violation. A failed token
/// check is answered with an ERROR before closing.
async fn authenticate<A: Authenticator>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A>>,
) -> Result<Identity, TactixError> {
    let first = tokio::time::timeout(state.config.auth_timeout, recv_data(conn)).await;
    let data = match first {
        Ok(Some(data)) => data,
        Ok(None) => {
            return Err(SessionError::AuthRequired.into());
        }
        Err(_) => {
            tracing::debug!(conn_id = %conn.id(), "authentication timed out");
            let _ = conn.close_policy("authentication required").await;
            return Err(SessionError::AuthRequired.into());
        }
    };

    let token = match state.codec.decode::<ClientMessage>(&data) {
        Ok(ClientMessage::Authenticate { token }) => token,
        _ => {
            let _ = conn.close_policy("authentication required").await;
            return Err(SessionError::AuthRequired.into());
        }
    };

    match state.auth.authenticate(&token).await {
        Ok(identity) => Ok(identity),
        Err(e) => {
            let reply = ServerMessage::Error {
                message: "Authentication failed".to_string(),
            };
            if let Ok(bytes) = state.codec.encode(&reply) {
                let _ = conn.send(&bytes).await;
            }
            let _ = conn.close().await;
            Err(e.into())
        }
    }
}

/// Receives the next data frame, skipping pongs.
async fn recv_data(conn: &WebSocketConnection) -> Option<Vec<u8>> {
    loop {
        match conn.recv().await {
            Ok(Some(Incoming::Data(data))) => return Some(data),
            Ok(Some(Incoming::Pong)) => continue,
            Ok(None) | Err(_) => return None,
        }
    }
}

/// Drains the handle's outbound channel onto the socket.
async fn write_loop(
    conn: Arc<WebSocketConnection>,
    mut rx: UnboundedReceiver<Outbound>,
    codec: JsonCodec,
) {
    while let Some(event) = rx.recv().await {
        match event {
            Outbound::Message(msg) => match codec.encode(&msg) {
                Ok(bytes) => {
                    if conn.send(&bytes).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode outbound message");
                }
            },
            Outbound::Ping => {
                if conn.ping().await.is_err() {
                    break;
                }
            }
            Outbound::Close => {
                let _ = conn.close().await;
                break;
            }
        }
    }
}

/// Receives and dispatches frames until the socket closes or errors.
async fn read_loop<A: Authenticator>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A>>,
    handle: &ConnectionHandle,
) {
    loop {
        match conn.recv().await {
            Ok(Some(Incoming::Pong)) => handle.mark_alive(),
            Ok(Some(Incoming::Data(data))) => {
                let msg = match state.codec.decode::<ClientMessage>(&data) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::debug!(
                            user_id = %handle.user_id(),
                            error = %e,
                            "undecodable message"
                        );
                        deny(handle, "Invalid message");
                        continue;
                    }
                };
                dispatch(state, handle, msg).await;
            }
            Ok(None) => {
                tracing::info!(user_id = %handle.user_id(), "connection closed cleanly");
                return;
            }
            Err(e) => {
                tracing::debug!(user_id = %handle.user_id(), error = %e, "recv error");
                return;
            }
        }
    }
}

/// Routes one decoded message to the right component.
///
/// Component locks are taken one at a time and released before the
/// next; no lock is ever held across `.await` on network I/O because
/// components only queue messages on handles.
async fn dispatch<A: Authenticator>(
    state: &Arc<ServerState<A>>,
    handle: &ConnectionHandle,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Authenticate { .. } => {
            deny(handle, "Already authenticated");
        }

        ClientMessage::SendInvite { target_user_id } => {
            let invite = {
                let mut invites = state.invites.lock().await;
                invites.create(handle.user_id(), handle.username(), target_user_id.clone())
            };
            match invite {
                Ok(invite) => {
                    // An offline target's invite just sits in the book
                    // until it expires or the target responds from a
                    // later connection.
                    if let Some(target) = state.registry.lock().await.lookup(&target_user_id) {
                        target.send(ServerMessage::GameInvite {
                            invite_id: invite.id,
                            from: InviteSender {
                                id: invite.from,
                                username: invite.from_username,
                            },
                        });
                    }
                }
                Err(e) => deny(handle, &e.to_string()),
            }
        }

        ClientMessage::RespondInvite { invite_id, accept } => {
            let outcome = {
                let mut invites = state.invites.lock().await;
                invites.respond(invite_id, handle.user_id(), accept)
            };
            let outcome = match outcome {
                Ok(o) => o,
                Err(e) => {
                    deny(handle, &e.to_string());
                    return;
                }
            };

            let sender = state.registry.lock().await.lookup(&outcome.sender);
            if let Some(sender_handle) = &sender {
                sender_handle.send(ServerMessage::InviteResponse {
                    invite_id,
                    accepted: accept,
                    from: handle.user_id().clone(),
                });
            }
            if !accept {
                return;
            }
            let Some(sender_handle) = sender else {
                deny(handle, "User is not online");
                return;
            };

            // Both players abandon matchmaking before being seated.
            {
                let mut queue = state.queue.lock().await;
                queue.dequeue(sender_handle.conn_id());
                queue.dequeue(handle.conn_id());
            }
            // The inviter plays X.
            let seated = state
                .rooms
                .lock()
                .await
                .create_matched(sender_handle.clone(), handle.clone());
            if let Err(e) = seated {
                deny(handle, &e.to_string());
                sender_handle.send(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
        }

        ClientMessage::JoinQueue(_) => {
            if state.rooms.lock().await.room_of(handle.conn_id()).is_some() {
                deny(handle, "Cannot join the queue while in a room");
                return;
            }
            state.queue.lock().await.enqueue(handle.clone());
            handle.send(ServerMessage::MatchmakingStatus {
                status: QueueStatus::Queued,
            });
        }

        ClientMessage::LeaveQueue(_) => {
            state.queue.lock().await.dequeue(handle.conn_id());
            handle.send(ServerMessage::MatchmakingStatus {
                status: QueueStatus::Left,
            });
        }

        ClientMessage::CreateRoom(_) => {
            state.queue.lock().await.dequeue(handle.conn_id());
            if let Err(e) = state.rooms.lock().await.create_waiting(handle.clone()) {
                deny(handle, &e.to_string());
            }
        }

        ClientMessage::JoinRoom { room_id } => {
            state.queue.lock().await.dequeue(handle.conn_id());
            if let Err(e) = state.rooms.lock().await.join(handle.clone(), room_id) {
                deny(handle, &e.to_string());
            }
        }

        ClientMessage::Move { position } => {
            if let Err(e) = state
                .rooms
                .lock()
                .await
                .apply_move(handle.conn_id(), position)
            {
                deny(handle, &e.to_string());
            }
        }
    }
}

/// Answers a rejected action with an ERROR to the sender only.
fn deny(handle: &ConnectionHandle, message: &str) {
    handle.send(ServerMessage::Error {
        message: message.to_string(),
    });
}
