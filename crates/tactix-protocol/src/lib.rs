//! Wire protocol for Tactix.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Board`],
//!   identity newtypes) — the `{ type, payload }` envelope shapes.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those shapes
//!   become bytes and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer knows nothing about connections, rooms, or
//! timers — it only serializes and deserializes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Board, ClientMessage, EMPTY_BOARD, InviteId, InviteSender, NoPayload,
    Outcome, QueueStatus, RoomId, ServerMessage, Symbol, UserId,
};
