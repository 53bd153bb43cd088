//! Periodic maintenance scheduler for Tactix.
//!
//! The server runs several slow background passes — heartbeat checks,
//! invite expiry, matchmaking pairing, idle-room reaping — each on its
//! own cadence. A [`Sweeper`] owns one such cadence; [`spawn_sweeper`]
//! wraps it in a task running a closure per pass.
//!
//! # Integration
//!
//! ```ignore
//! let state = state.clone();
//! spawn_sweeper("invites", SweepConfig::every(Duration::from_secs(60)), move || {
//!     let state = state.clone();
//!     async move {
//!         state.invites.lock().await.sweep();
//!     }
//! });
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Cadence of one maintenance sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Time between passes.
    pub interval: Duration,
    /// Random jitter (0–max) added to the *first* pass so sweeps
    /// started together don't all fire at the same instant.
    pub initial_jitter: Duration,
}

impl SweepConfig {
    /// Default jitter applied to the first pass.
    pub const DEFAULT_JITTER: Duration = Duration::from_millis(500);

    /// A config firing every `interval` with default jitter.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            initial_jitter: Self::DEFAULT_JITTER,
        }
    }

    /// Removes first-pass jitter, for deterministic tests.
    pub fn without_jitter(mut self) -> Self {
        self.initial_jitter = Duration::ZERO;
        self
    }
}

/// Information about a completed wait, returned by [`Sweeper::wait`].
#[derive(Debug, Clone)]
pub struct SweepInfo {
    /// Monotonically increasing pass number (starts at 1).
    pub pass: u64,
    /// `true` if this pass fired late (the previous pass overran its
    /// interval).
    pub overdue: bool,
}

// ---------------------------------------------------------------------------
// Sweeper
// ---------------------------------------------------------------------------

/// One maintenance cadence.
///
/// Deadlines are rescheduled from *now* after every pass: a slow pass
/// delays the next one instead of causing a burst of catch-up passes.
pub struct Sweeper {
    interval: Duration,
    next: TokioInstant,
    pass_count: u64,
}

impl Sweeper {
    pub fn new(config: SweepConfig) -> Self {
        let jitter = if config.initial_jitter.is_zero() {
            Duration::ZERO
        } else {
            let us = rand::rng().random_range(0..config.initial_jitter.as_micros() as u64);
            Duration::from_micros(us)
        };
        debug!(interval = ?config.interval, ?jitter, "sweeper created");
        Self {
            interval: config.interval,
            next: TokioInstant::now() + config.interval + jitter,
            pass_count: 0,
        }
    }

    /// A sweeper firing every `interval` with default jitter.
    pub fn every(interval: Duration) -> Self {
        Self::new(SweepConfig::every(interval))
    }

    /// Waits until the next pass is due.
    pub async fn wait(&mut self) -> SweepInfo {
        time::sleep_until(self.next).await;

        let now = TokioInstant::now();
        self.pass_count += 1;

        // >10% late means the previous pass overran its interval.
        let late_by = now.saturating_duration_since(self.next);
        let overdue = late_by > self.interval / 10;
        if overdue {
            warn!(
                pass = self.pass_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "maintenance pass overdue"
            );
        }
        self.next = now + self.interval;

        trace!(pass = self.pass_count, "maintenance pass due");
        SweepInfo {
            pass: self.pass_count,
            overdue,
        }
    }

    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Spawns a task running `pass` once per sweep interval, forever.
///
/// The task ends when its runtime shuts down; sweeps hold no
/// resources that need ordered teardown.
pub fn spawn_sweeper<F, Fut>(
    name: &'static str,
    config: SweepConfig,
    mut pass: F,
) -> tokio::task::JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut sweeper = Sweeper::new(config);
        loop {
            let info = sweeper.wait().await;
            trace!(sweeper = name, pass = info.pass, "running maintenance pass");
            pass().await;
        }
    })
}

// =========================================================================
// Tests
// =========================================================================
