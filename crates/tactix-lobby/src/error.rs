//! Error types for invites and matchmaking.

/// Errors surfaced by the lobby to the originating connection.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LobbyError {
    /// The sender already has an unresolved invite to this user.
    #[error("a pending invite already exists")]
    DuplicatePending,

    /// The invite does not exist, was already answered, or expired.
    /// One variant for all three: the responder learns nothing about
    /// other users' invite traffic.
    #[error("invite not found")]
    InviteNotFound,

    /// A player tried to invite themselves.
    #[error("cannot invite yourself")]
    SelfInvite,
}
