//! Unified error type for the Tactix server.

use tactix_lobby::LobbyError;
use tactix_protocol::ProtocolError;
use tactix_room::RoomError;
use tactix_session::SessionError;
use tactix_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tactix` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TactixError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, registry).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A lobby-level error (invites, matchmaking).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A room-level error (membership, moves).
    #[error(transparent)]
    Room(#[from] RoomError),
}
