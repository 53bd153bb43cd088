//! The matchmaking queue: rating-proximity pairing with a tolerance
//! window that widens the longer a player waits.
//!
//! The queue itself never runs timers; the server calls
//! [`MatchQueue::pair`] on its matchmaking cadence and turns each
//! returned [`MatchPair`] into a room.

use std::time::{Duration, Instant};

use tactix_session::ConnectionHandle;
use tactix_transport::ConnectionId;

/// How aggressively the rating window widens.
#[derive(Debug, Clone, Copy)]
pub struct PairingConfig {
    /// Acceptable rating gap at the moment of enqueue.
    pub base_tolerance: u32,
    /// Extra tolerance granted per full second the elder of a
    /// candidate pair has waited.
    pub widen_per_sec: u32,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            base_tolerance: 200,
            widen_per_sec: 10,
        }
    }
}

/// Two queued players matched into a game, seats already drawn.
#[derive(Debug)]
pub struct MatchPair {
    pub x: ConnectionHandle,
    pub o: ConnectionHandle,
}

struct QueuedPlayer {
    handle: ConnectionHandle,
    rating: u32,
    enqueued_at: Instant,
}

/// Players waiting for an opponent, oldest first.
pub struct MatchQueue {
    waiting: Vec<QueuedPlayer>,
    config: PairingConfig,
}

impl MatchQueue {
    pub fn new(config: PairingConfig) -> Self {
        Self {
            waiting: Vec::new(),
            config,
        }
    }

    /// Adds a connection to the queue. Re-joining restarts the wait:
    /// any previous entry for the same connection is dropped first, so
    /// a double JOIN_QUEUE can never self-match.
    pub fn enqueue(&mut self, handle: ConnectionHandle) {
        self.dequeue(handle.conn_id());
        let rating = handle.identity().rating;
        tracing::debug!(user_id = %handle.user_id(), rating, "player queued");
        self.waiting.push(QueuedPlayer {
            handle,
            rating,
            enqueued_at: Instant::now(),
        });
    }

    /// Removes a connection from the queue. Returns `false` if it was
    /// not waiting, which callers treat as a no-op.
    pub fn dequeue(&mut self, conn_id: ConnectionId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|p| p.handle.conn_id() != conn_id);
        before != self.waiting.len()
    }

    /// Whether this connection is currently waiting.
    pub fn contains(&self, conn_id: ConnectionId) -> bool {
        self.waiting.iter().any(|p| p.handle.conn_id() == conn_id)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// One greedy pairing pass: scan oldest-first, matching each
    /// unmatched player with the first later entry inside the elder's
    /// rating window. Matched players leave the queue; X and O are
    /// drawn at random per pair.
    pub fn pair(&mut self) -> Vec<MatchPair> {
        self.pair_at(Instant::now())
    }

    fn pair_at(&mut self, now: Instant) -> Vec<MatchPair> {
        self.waiting.sort_by_key(|p| p.enqueued_at);

        let mut pairs = Vec::new();
        let mut matched = vec![false; self.waiting.len()];
        for i in 0..self.waiting.len() {
            if matched[i] {
                continue;
            }
            let elder = &self.waiting[i];
            let tolerance = self.tolerance_for(now.saturating_duration_since(elder.enqueued_at));
            let partner = (i + 1..self.waiting.len()).find(|&j| {
                !matched[j] && elder.rating.abs_diff(self.waiting[j].rating) <= tolerance
            });
            if let Some(j) = partner {
                matched[i] = true;
                matched[j] = true;
                pairs.push((i, j));
            }
        }

        // Drain matched players back-to-front so indices stay valid.
        let mut out = Vec::with_capacity(pairs.len());
        for (i, j) in pairs.into_iter().rev() {
            let second = self.waiting.remove(j);
            let first = self.waiting.remove(i);
            tracing::info!(
                a = %first.handle.user_id(),
                b = %second.handle.user_id(),
                "players matched"
            );
            let (x, o) = if rand::random::<bool>() {
                (first.handle, second.handle)
            } else {
                (second.handle, first.handle)
            };
            out.push(MatchPair { x, o });
        }
        out.reverse();
        out
    }

    fn tolerance_for(&self, waited: Duration) -> u32 {
        let widened = (waited.as_secs() as u32).saturating_mul(self.config.widen_per_sec);
        self.config.base_tolerance.saturating_add(widened)
    }

    #[cfg(test)]
    fn backdate(&mut self, conn_id: ConnectionId, by: Duration) {
        for p in &mut self.waiting {
            if p.handle.conn_id() == conn_id {
                p.enqueued_at -= by;
            }
        }
    }
}

impl Default for MatchQueue {
    fn default() -> Self {
        Self::new(PairingConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
