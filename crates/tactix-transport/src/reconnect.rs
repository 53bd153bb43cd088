//! Client-side reconnection policy.
//!
//! Reconnection is an explicit state machine — `Disconnected →
//! Reconnecting(attempt n) → Connected` — with a capped attempt count
//! and jittered exponential backoff, rather than recursive retry
//! closures buried in the transport.

use std::time::Duration;

use rand::Rng;

/// Backoff parameters for reconnection attempts.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Maximum number of attempts before giving up.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Jitter fraction in `0.0..=1.0`. The computed delay is scaled by
    /// a random factor in `[1 - jitter, 1 + jitter]` to spread
    /// reconnection storms.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: 0.25,
        }
    }
}

impl ReconnectPolicy {
    /// The backoff delay before the given attempt (1-based), or `None`
    /// once the attempt cap is exceeded.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let exp = self
            .base_delay
            .saturating_mul(1u32 << (attempt - 1).min(16))
            .min(self.max_delay);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let factor = if jitter > 0.0 {
            rand::rng().random_range(1.0 - jitter..=1.0 + jitter)
        } else {
            1.0
        };
        Some(Duration::from_secs_f64(exp.as_secs_f64() * factor))
    }
}

/// The connection lifecycle as seen from the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectState {
    Disconnected,
    Reconnecting { attempt: u32 },
    Connected,
}

/// Drives [`ReconnectState`] transitions under a [`ReconnectPolicy`].
#[derive(Debug, Clone)]
pub struct Reconnector {
    policy: ReconnectPolicy,
    state: ReconnectState,
}

impl Reconnector {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ReconnectState::Disconnected,
        }
    }

    /// Current state.
    pub fn state(&self) -> ReconnectState {
        self.state
    }

    /// Begins (or continues) reconnecting. Returns the jittered delay
    /// to wait before the next attempt, or `None` if the attempt cap
    /// is exhausted (state falls back to `Disconnected`).
    pub fn next_attempt(&mut self) -> Option<(u32, Duration)> {
        let attempt = match self.state {
            ReconnectState::Reconnecting { attempt } => attempt + 1,
            _ => 1,
        };
        match self.policy.delay_for(attempt) {
            Some(delay) => {
                self.state = ReconnectState::Reconnecting { attempt };
                Some((attempt, delay))
            }
            None => {
                self.state = ReconnectState::Disconnected;
                None
            }
        }
    }

    /// Marks the connection established, resetting the attempt count.
    pub fn on_connected(&mut self) {
        self.state = ReconnectState::Connected;
    }

    /// Marks the connection lost.
    pub fn on_disconnected(&mut self) {
        self.state = ReconnectState::Disconnected;
    }
}
