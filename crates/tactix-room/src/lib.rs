//! Game rooms for Tactix: seats, spectators, board rules, and the
//! room lifecycle from creation to destruction.
//!
//! [`RoomManager`] is the single owner of every live room. It enforces
//! the membership invariants (one room per connection, one connection
//! per seat), applies moves through the pure [`rules`] module, and
//! queues every broadcast on occupant handles. Rooms are destroyed in
//! the same call that finishes them — by a winning move, a draw, a
//! player's disconnect, or the idle reaper.

mod error;
mod manager;
mod room;
pub mod rules;

pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{Room, RoomPhase};
