//! Direct game invites between named players.
//!
//! The book is a plain map owned behind the server's lobby lock. Every
//! invite carries a hard expiry; a periodic sweep marks overdue
//! pending invites expired and garbage-collects anything past its
//! deadline, so an unanswered invite can never pin memory.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tactix_protocol::{InviteId, UserId};

use crate::LobbyError;

/// Lifecycle of an invite. `Pending` is the only state that accepts a
/// response; the first resolution wins and later ones see
/// [`LobbyError::InviteNotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

/// One outstanding (or recently resolved) invite.
#[derive(Debug, Clone)]
pub struct Invite {
    pub id: InviteId,
    pub from: UserId,
    pub from_username: String,
    pub to: UserId,
    pub status: InviteStatus,
    pub expires_at: Instant,
}

/// What a successful response resolves to. The server notifies the
/// original sender and, on acceptance, creates the room.
#[derive(Debug, Clone)]
pub struct InviteOutcome {
    pub invite_id: InviteId,
    pub sender: UserId,
    pub responder: UserId,
    pub accepted: bool,
}

/// All invites currently tracked, keyed by invite ID.
pub struct InviteBook {
    invites: HashMap<InviteId, Invite>,
    ttl: Duration,
}

impl InviteBook {
    /// Creates an empty book whose invites expire `ttl` after creation.
    pub fn new(ttl: Duration) -> Self {
        Self {
            invites: HashMap::new(),
            ttl,
        }
    }

    /// Records a new pending invite from `from` to `to`.
    ///
    /// Rejects self-invites and duplicates: while a pending, unexpired
    /// invite from `from` to `to` exists, no new one may be created.
    /// The reverse direction is its own invite and stays allowed.
    pub fn create(
        &mut self,
        from: &UserId,
        from_username: &str,
        to: UserId,
    ) -> Result<Invite, LobbyError> {
        if *from == to {
            return Err(LobbyError::SelfInvite);
        }
        let now = Instant::now();
        let duplicate = self.invites.values().any(|inv| {
            inv.status == InviteStatus::Pending
                && inv.expires_at > now
                && inv.from == *from
                && inv.to == to
        });
        if duplicate {
            return Err(LobbyError::DuplicatePending);
        }

        let invite = Invite {
            id: InviteId::new(),
            from: from.clone(),
            from_username: from_username.to_string(),
            to,
            status: InviteStatus::Pending,
            expires_at: now + self.ttl,
        };
        tracing::debug!(invite_id = %invite.id, from = %invite.from, to = %invite.to, "invite created");
        self.invites.insert(invite.id, invite.clone());
        Ok(invite)
    }

    /// Resolves a pending invite. Only the invited player may respond,
    /// and only while the invite is pending and unexpired; everything
    /// else is [`LobbyError::InviteNotFound`].
    pub fn respond(
        &mut self,
        id: InviteId,
        responder: &UserId,
        accept: bool,
    ) -> Result<InviteOutcome, LobbyError> {
        let invite = self.invites.get_mut(&id).ok_or(LobbyError::InviteNotFound)?;
        if invite.to != *responder || invite.status != InviteStatus::Pending {
            return Err(LobbyError::InviteNotFound);
        }
        if invite.expires_at <= Instant::now() {
            invite.status = InviteStatus::Expired;
            return Err(LobbyError::InviteNotFound);
        }

        invite.status = if accept {
            InviteStatus::Accepted
        } else {
            InviteStatus::Declined
        };
        tracing::debug!(invite_id = %id, accepted = accept, "invite resolved");
        Ok(InviteOutcome {
            invite_id: id,
            sender: invite.from.clone(),
            responder: responder.clone(),
            accepted: accept,
        })
    }

    /// Marks overdue pending invites expired and drops every invite
    /// past its deadline. Returns the number dropped.
    pub fn sweep(&mut self) -> usize {
        let now = Instant::now();
        for invite in self.invites.values_mut() {
            if invite.status == InviteStatus::Pending && invite.expires_at <= now {
                tracing::debug!(invite_id = %invite.id, from = %invite.from, "invite expired");
                invite.status = InviteStatus::Expired;
            }
        }
        let before = self.invites.len();
        self.invites.retain(|_, inv| inv.expires_at > now);
        before - self.invites.len()
    }

    /// Looks up an invite by ID.
    pub fn get(&self, id: InviteId) -> Option<&Invite> {
        self.invites.get(&id)
    }

    /// Number of tracked invites, resolved ones included until their
    /// expiry passes.
    pub fn len(&self) -> usize {
        self.invites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invites.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
