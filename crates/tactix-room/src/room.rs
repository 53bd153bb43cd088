//! One game room: two seats, a board, and any number of spectators.

use std::collections::HashMap;
use std::time::Instant;

use tactix_protocol::{Board, RoomId, ServerMessage, Symbol, EMPTY_BOARD};
use tactix_session::ConnectionHandle;
use tactix_transport::ConnectionId;

/// Where the room is in its lifecycle.
///
/// `Waiting` rooms have an open O seat; `Finished` is transient — the
/// manager destroys a room in the same call that finishes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Waiting,
    Playing,
    Finished,
}

pub struct Room {
    id: RoomId,
    /// Seats indexed by [`Symbol::seat`]: X at 0, O at 1.
    seats: [Option<ConnectionHandle>; 2],
    spectators: HashMap<ConnectionId, ConnectionHandle>,
    board: Board,
    current_player: Symbol,
    phase: RoomPhase,
    last_activity: Instant,
}

impl Room {
    /// A room created ahead of an opponent. The creator holds X.
    pub fn waiting(id: RoomId, host: ConnectionHandle) -> Self {
        Self {
            id,
            seats: [Some(host), None],
            spectators: HashMap::new(),
            board: EMPTY_BOARD,
            current_player: Symbol::X,
            phase: RoomPhase::Waiting,
            last_activity: Instant::now(),
        }
    }

    /// A room born playing, both seats filled (matchmaking or an
    /// accepted invite).
    pub fn matched(id: RoomId, x: ConnectionHandle, o: ConnectionHandle) -> Self {
        Self {
            id,
            seats: [Some(x), Some(o)],
            spectators: HashMap::new(),
            board: EMPTY_BOARD,
            current_player: Symbol::X,
            phase: RoomPhase::Playing,
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Symbol {
        self.current_player
    }

    pub(crate) fn set_phase(&mut self, phase: RoomPhase) {
        self.phase = phase;
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub(crate) fn last_activity(&self) -> Instant {
        self.last_activity
    }

    #[cfg(test)]
    pub(crate) fn backdate_activity(&mut self, by: std::time::Duration) {
        self.last_activity -= by;
    }

    pub fn seat(&self, symbol: Symbol) -> Option<&ConnectionHandle> {
        self.seats[symbol.seat()].as_ref()
    }

    pub(crate) fn sit(&mut self, symbol: Symbol, handle: ConnectionHandle) {
        self.seats[symbol.seat()] = Some(handle);
    }

    /// The symbol this connection plays, or `None` for spectators and
    /// strangers.
    pub fn symbol_of(&self, conn_id: ConnectionId) -> Option<Symbol> {
        [Symbol::X, Symbol::O]
            .into_iter()
            .find(|s| matches!(self.seat(*s), Some(h) if h.conn_id() == conn_id))
    }

    pub fn is_spectator(&self, conn_id: ConnectionId) -> bool {
        self.spectators.contains_key(&conn_id)
    }

    pub(crate) fn add_spectator(&mut self, handle: ConnectionHandle) {
        self.spectators.insert(handle.conn_id(), handle);
    }

    pub(crate) fn remove_spectator(&mut self, conn_id: ConnectionId) -> bool {
        self.spectators.remove(&conn_id).is_some()
    }

    pub(crate) fn place(&mut self, position: usize, symbol: Symbol) {
        self.board[position] = Some(symbol);
        self.current_player = symbol.opponent();
        self.touch();
    }

    /// Every connection in the room: both seats plus spectators.
    pub fn occupants(&self) -> impl Iterator<Item = &ConnectionHandle> {
        self.seats
            .iter()
            .flatten()
            .chain(self.spectators.values())
    }

    /// Sends a message to every occupant.
    pub fn broadcast(&self, msg: &ServerMessage) {
        for handle in self.occupants() {
            handle.send(msg.clone());
        }
    }

    /// Sends a message to every occupant except one connection.
    pub fn broadcast_except(&self, msg: &ServerMessage, skip: ConnectionId) {
        for handle in self.occupants() {
            if handle.conn_id() != skip {
                handle.send(msg.clone());
            }
        }
    }

    /// The state snapshot a late joiner receives.
    pub fn snapshot(&self) -> ServerMessage {
        ServerMessage::GameState {
            board: self.board,
            current_player: self.current_player,
            winner: None,
        }
    }
}
