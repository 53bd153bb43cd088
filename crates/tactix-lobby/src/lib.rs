//! Pre-game coordination for Tactix: how two players end up in the
//! same room.
//!
//! Two paths lead to a game:
//!
//! 1. **Invites** — a named challenge from one player to another, with
//!    a hard TTL ([`InviteBook`])
//! 2. **Matchmaking** — an anonymous queue paired by rating proximity,
//!    with a window that widens as a player waits ([`MatchQueue`])
//!
//! Both structures are plain maps and vectors; the server owns each
//! behind a `tokio::sync::Mutex` and drives their periodic passes.

mod error;
mod invite;
mod queue;

pub use error::LobbyError;
pub use invite::{Invite, InviteBook, InviteOutcome, InviteStatus};
pub use queue::{MatchPair, MatchQueue, PairingConfig};
