//! Error types for room membership and gameplay.

/// Errors surfaced to the connection that caused them. None of these
/// are broadcast; the other occupants of a room never see a peer's
/// rejected action.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RoomError {
    /// The room ID does not name a live room.
    #[error("room not found")]
    RoomNotFound,

    /// A player's connection died before they could be seated.
    #[error("player disconnected")]
    PlayerGone,

    /// The connection already occupies a room. One room per
    /// connection, spectating included.
    #[error("already in a room")]
    AlreadyInRoom,

    /// The connection is not in any room.
    #[error("not in a room")]
    NotInRoom,

    /// A spectator tried to play.
    #[error("spectators cannot make moves")]
    NotAPlayer,

    /// The game has not started: the room is still waiting for an
    /// opponent.
    #[error("waiting for an opponent")]
    GameNotStarted,

    /// The game already ended.
    #[error("the game is over")]
    GameFinished,

    /// It is the other player's turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The cell index is outside the board.
    #[error("invalid board position")]
    InvalidPosition,

    /// The cell is already taken.
    #[error("that cell is occupied")]
    CellOccupied,
}
