//! # Tactix
//!
//! Session orchestration server for real-time multiplayer tic-tac-toe.
//!
//! Tactix keeps every player's single live WebSocket, negotiates games
//! through direct invites and a rating-based matchmaking queue, and
//! runs the rooms those games are played in — including heartbeat
//! liveness, forfeit-on-disconnect, and the background sweeps that
//! keep all of it bounded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tactix::prelude::*;
//!
//! // Implement Authenticator for your identity provider, then:
//! // let server = TactixServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build(my_auth)
//! //     .await?;
//! // server.run().await
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::TactixError;
pub use server::{TactixServer, TactixServerBuilder};

pub mod prelude {
    //! Everything needed to stand up a server.
    pub use crate::{ServerConfig, TactixError, TactixServer, TactixServerBuilder};
    pub use tactix_lobby::PairingConfig;
    pub use tactix_protocol::{
        Board, ClientMessage, InviteId, NoPayload, Outcome, RoomId, ServerMessage, Symbol,
        UserId,
    };
    pub use tactix_session::{Authenticator, Identity, SessionError};
}
