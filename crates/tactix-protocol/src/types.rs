//! Core protocol types for Tactix's wire format.
//!
//! Every message on the wire is a JSON object of the shape
//! `{ "type": "...", "payload": { ... } }`. The [`ClientMessage`] and
//! [`ServerMessage`] enums are closed tagged unions over exactly those
//! shapes — an inbound message with an unknown `type` or a missing
//! required field fails at the codec and never reaches a component.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The durable identity of a user.
///
/// Newtype over an opaque string issued by the external auth
/// collaborator. The orchestration core never interprets it — it is
/// only ever compared and used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A unique identifier for a room. Opaque UUIDv4 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Allocates a fresh random room ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for an invite. Opaque UUIDv4 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteId(pub Uuid);

impl InviteId {
    /// Allocates a fresh random invite ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InviteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InviteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Board types
// ---------------------------------------------------------------------------

/// A player's mark. Also identifies the two seats of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The other player's symbol.
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    /// Seat index: X = 0, O = 1.
    pub fn seat(self) -> usize {
        match self {
            Self::X => 0,
            Self::O => 1,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::O => write!(f, "O"),
        }
    }
}

/// The 9-cell board in row-major order.
///
/// Serializes as a 9-element array of `"X"`, `"O"`, or `null`, which is
/// what clients render directly.
pub type Board = [Option<Symbol>; 9];

/// An all-empty board.
pub const EMPTY_BOARD: Board = [None; 9];

/// The terminal outcome of a game.
///
/// `"draw"` is lowercase on the wire while symbols stay uppercase,
/// matching the client contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    X,
    O,
    #[serde(rename = "draw")]
    Draw,
}

impl From<Symbol> for Outcome {
    fn from(s: Symbol) -> Self {
        match s {
            Symbol::X => Self::X,
            Symbol::O => Self::O,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::O => write!(f, "O"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Payload of client messages that carry no data.
///
/// The envelope makes `payload` a required field, so clients send these
/// as `"payload": {}` — but an absent or `null` payload decodes too.
/// Always serializes as an empty object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPayload;

impl Serialize for NoPayload {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        serializer.serialize_map(Some(0))?.end()
    }
}

impl<'de> Deserialize<'de> for NoPayload {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NoPayloadVisitor;

        impl<'de> serde::de::Visitor<'de> for NoPayloadVisitor {
            type Value = NoPayload;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an empty payload object, null, or nothing")
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<NoPayload, E> {
                Ok(NoPayload)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<NoPayload, E> {
                Ok(NoPayload)
            }

            fn visit_some<D2: serde::Deserializer<'de>>(
                self,
                deserializer: D2,
            ) -> Result<NoPayload, D2::Error> {
                deserializer.deserialize_map(NoPayloadVisitor)
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> Result<NoPayload, A::Error> {
                use serde::de::IgnoredAny;
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(NoPayload)
            }
        }

        // Going through `deserialize_option` is what lets a missing
        // `payload` key decode: serde's adjacently-tagged enum answers
        // a missing content field with `visit_none`.
        deserializer.deserialize_option(NoPayloadVisitor)
    }
}

/// Messages a client can send.
///
/// `tag = "type", content = "payload"` produces the adjacently tagged
/// envelope the clients speak; variant names go SCREAMING_SNAKE_CASE
/// and payload fields camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Must be the first message on a connection. The token is opaque
    /// to the core — the configured authenticator verifies it.
    Authenticate { token: String },

    /// Invite a specific user to a game.
    SendInvite { target_user_id: UserId },

    /// Accept or decline a pending invite addressed to the sender.
    RespondInvite { invite_id: InviteId, accept: bool },

    /// Enter the matchmaking queue.
    JoinQueue(NoPayload),

    /// Leave the matchmaking queue.
    LeaveQueue(NoPayload),

    /// Create a room and wait for an opponent. The creator is seated X.
    CreateRoom(NoPayload),

    /// Join a specific room: fills the open O seat of a waiting room,
    /// otherwise joins as a spectator.
    JoinRoom { room_id: RoomId },

    /// Place a mark at a board position (0–8, row-major).
    Move { position: u8 },
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// The `from` block of a [`ServerMessage::GameInvite`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteSender {
    pub id: UserId,
    pub username: String,
}

/// The client's position in the matchmaking queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Queued,
    Left,
}

/// Messages the server can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Auth handshake succeeded; echoes the durable identity.
    Authenticated { user_id: UserId, username: String },

    /// A user invited the recipient to a game.
    GameInvite {
        invite_id: InviteId,
        from: InviteSender,
    },

    /// The recipient's earlier invite was accepted or declined.
    InviteResponse {
        invite_id: InviteId,
        accepted: bool,
        from: UserId,
    },

    /// Matchmaking queue acknowledgement.
    MatchmakingStatus { status: QueueStatus },

    /// A game begins; tells the recipient which symbol they play.
    GameStart {
        room_id: RoomId,
        board: Board,
        current_player: Symbol,
        symbol: Symbol,
    },

    /// Board snapshot after a move (or on spectator join).
    GameState {
        board: Board,
        current_player: Symbol,
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<Outcome>,
    },

    /// A seated player left the room.
    PlayerLeft { player: Symbol },

    /// Terminal outcome: win, forfeit win, or draw.
    GameOver { winner: Outcome, board: Board },

    /// A per-message failure, delivered only to the offending sender.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
