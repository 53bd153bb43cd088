//! The room manager: every live room, who occupies it, and the full
//! move/join/leave lifecycle.
//!
//! The manager owns all broadcast decisions. Callers hand it a
//! connection and an intent; it validates, mutates, and queues the
//! resulting messages on occupant handles. Rejections go back as a
//! [`RoomError`] for the server to relay to the offending sender only.

use std::collections::HashMap;
use std::time::Duration;

use tactix_protocol::{Outcome, RoomId, ServerMessage, Symbol};
use tactix_session::ConnectionHandle;
use tactix_transport::ConnectionId;

use crate::room::{Room, RoomPhase};
use crate::rules;
use crate::RoomError;

pub struct RoomManager {
    rooms: HashMap<RoomId, Room>,
    /// Reverse index: which room each connection is in. One entry per
    /// connection, spectators included.
    occupants: HashMap<ConnectionId, RoomId>,
    idle_timeout: Duration,
}

impl RoomManager {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            rooms: HashMap::new(),
            occupants: HashMap::new(),
            idle_timeout,
        }
    }

    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// The room a connection currently occupies.
    pub fn room_of(&self, conn_id: ConnectionId) -> Option<RoomId> {
        self.occupants.get(&conn_id).copied()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Creates a waiting room with the creator seated X, and tells
    /// them the room ID via GAME_START so they can share it.
    pub fn create_waiting(&mut self, host: ConnectionHandle) -> Result<RoomId, RoomError> {
        if self.occupants.contains_key(&host.conn_id()) {
            return Err(RoomError::AlreadyInRoom);
        }
        let id = RoomId::new();
        tracing::info!(room_id = %id, host = %host.user_id(), "waiting room created");
        host.send(ServerMessage::GameStart {
            room_id: id,
            board: tactix_protocol::EMPTY_BOARD,
            current_player: Symbol::X,
            symbol: Symbol::X,
        });
        self.occupants.insert(host.conn_id(), id);
        self.rooms.insert(id, Room::waiting(id, host));
        Ok(id)
    }

    /// Creates a room already playing, for a matched or invited pair.
    /// Both players receive GAME_START carrying their own symbol.
    pub fn create_matched(
        &mut self,
        x: ConnectionHandle,
        o: ConnectionHandle,
    ) -> Result<RoomId, RoomError> {
        // A player can disconnect between pairing (or invite lookup)
        // and seating. Their disconnect sweep already ran and found no
        // room, so seating them now would leave the opponent in a
        // playing room nothing ever tears down.
        if x.is_defunct() || o.is_defunct() {
            return Err(RoomError::PlayerGone);
        }
        if self.occupants.contains_key(&x.conn_id()) || self.occupants.contains_key(&o.conn_id()) {
            return Err(RoomError::AlreadyInRoom);
        }
        let id = RoomId::new();
        tracing::info!(
            room_id = %id,
            x = %x.user_id(),
            o = %o.user_id(),
            "matched room created"
        );
        for (handle, symbol) in [(&x, Symbol::X), (&o, Symbol::O)] {
            handle.send(ServerMessage::GameStart {
                room_id: id,
                board: tactix_protocol::EMPTY_BOARD,
                current_player: Symbol::X,
                symbol,
            });
            self.occupants.insert(handle.conn_id(), id);
        }
        self.rooms.insert(id, Room::matched(id, x, o));
        Ok(id)
    }

    /// Joins a room: fills the open O seat of a waiting room and
    /// starts the game, otherwise joins as a spectator and receives a
    /// board snapshot.
    pub fn join(&mut self, handle: ConnectionHandle, room_id: RoomId) -> Result<(), RoomError> {
        if handle.is_defunct() {
            return Err(RoomError::PlayerGone);
        }
        if self.occupants.contains_key(&handle.conn_id()) {
            return Err(RoomError::AlreadyInRoom);
        }
        let room = self.rooms.get_mut(&room_id).ok_or(RoomError::RoomNotFound)?;

        if room.phase() == RoomPhase::Waiting {
            tracing::info!(room_id = %room_id, o = %handle.user_id(), "opponent joined, game starting");
            room.sit(Symbol::O, handle.clone());
            room.set_phase(RoomPhase::Playing);
            room.touch();
            for symbol in [Symbol::X, Symbol::O] {
                if let Some(player) = room.seat(symbol) {
                    player.send(ServerMessage::GameStart {
                        room_id,
                        board: *room.board(),
                        current_player: room.current_player(),
                        symbol,
                    });
                }
            }
        } else {
            tracing::debug!(room_id = %room_id, user = %handle.user_id(), "spectator joined");
            handle.send(room.snapshot());
            room.add_spectator(handle.clone());
        }
        self.occupants.insert(handle.conn_id(), room_id);
        Ok(())
    }

    /// Applies a move for a seated player. Broadcasts the new state to
    /// the whole room; a finishing move broadcasts GAME_OVER instead
    /// and destroys the room.
    pub fn apply_move(&mut self, conn_id: ConnectionId, position: u8) -> Result<(), RoomError> {
        let room_id = self.room_of(conn_id).ok_or(RoomError::NotInRoom)?;
        let room = self.rooms.get_mut(&room_id).ok_or(RoomError::NotInRoom)?;

        let symbol = match room.symbol_of(conn_id) {
            Some(s) => s,
            None => return Err(RoomError::NotAPlayer),
        };
        match room.phase() {
            RoomPhase::Waiting => return Err(RoomError::GameNotStarted),
            RoomPhase::Finished => return Err(RoomError::GameFinished),
            RoomPhase::Playing => {}
        }
        if room.current_player() != symbol {
            return Err(RoomError::NotYourTurn);
        }
        let position = usize::from(position);
        if position >= 9 {
            return Err(RoomError::InvalidPosition);
        }
        if room.board()[position].is_some() {
            return Err(RoomError::CellOccupied);
        }

        room.place(position, symbol);

        match rules::evaluate(room.board()) {
            Some(outcome) => {
                room.set_phase(RoomPhase::Finished);
                tracing::info!(room_id = %room_id, winner = %outcome, "game over");
                room.broadcast(&ServerMessage::GameOver {
                    winner: outcome,
                    board: *room.board(),
                });
                self.destroy(room_id);
            }
            None => {
                room.broadcast(&ServerMessage::GameState {
                    board: *room.board(),
                    current_player: room.current_player(),
                    winner: None,
                });
            }
        }
        Ok(())
    }

    /// Removes a disconnected connection from its room, if any.
    ///
    /// Spectators leave silently. A seated player's departure notifies
    /// the rest of the room; if a game was in progress the remaining
    /// player wins by forfeit. Either way the room is destroyed — a
    /// no-op for connections not in a room, so racing cleanup paths
    /// are safe.
    pub fn handle_disconnect(&mut self, conn_id: ConnectionId) {
        let Some(room_id) = self.occupants.remove(&conn_id) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };

        if room.remove_spectator(conn_id) {
            tracing::debug!(room_id = %room_id, "spectator left");
            return;
        }
        let Some(symbol) = room.symbol_of(conn_id) else {
            return;
        };

        tracing::info!(room_id = %room_id, player = %symbol, "player left room");
        room.broadcast_except(&ServerMessage::PlayerLeft { player: symbol }, conn_id);
        if room.phase() == RoomPhase::Playing {
            room.set_phase(RoomPhase::Finished);
            room.broadcast_except(
                &ServerMessage::GameOver {
                    winner: Outcome::from(symbol.opponent()),
                    board: *room.board(),
                },
                conn_id,
            );
        }
        self.destroy(room_id);
    }

    /// Destroys `waiting` rooms idle past the timeout, so abandoned
    /// rooms cannot pin memory. Playing rooms are left alone: the
    /// liveness monitor already tears them down through disconnects.
    /// Occupants are told the room closed; returns the number reaped.
    pub fn reap_idle(&mut self) -> usize {
        let stale: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|r| {
                r.phase() == RoomPhase::Waiting && r.last_activity().elapsed() >= self.idle_timeout
            })
            .map(Room::id)
            .collect();
        for room_id in &stale {
            if let Some(room) = self.rooms.get(room_id) {
                tracing::info!(%room_id, "reaping idle room");
                room.broadcast(&ServerMessage::Error {
                    message: "Room closed due to inactivity".to_string(),
                });
            }
            self.destroy(*room_id);
        }
        stale.len()
    }

    fn destroy(&mut self, room_id: RoomId) {
        if let Some(room) = self.rooms.remove(&room_id) {
            for handle in room.occupants() {
                self.occupants.remove(&handle.conn_id());
            }
            tracing::debug!(%room_id, "room destroyed");
        }
    }

    #[cfg(test)]
    pub(crate) fn backdate_room(&mut self, room_id: RoomId, by: Duration) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.backdate_activity(by);
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
