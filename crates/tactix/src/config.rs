//! Server configuration: every timer and threshold in one place.

use std::time::Duration;

use tactix_lobby::PairingConfig;

/// Full configuration for a Tactix server.
///
/// The defaults match the deployed client contract; tests shrink the
/// intervals to keep themselves fast.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// How long an accepted connection may sit unauthenticated before
    /// it is closed.
    pub auth_timeout: Duration,
    /// Cadence of the heartbeat sweep. A connection that misses two
    /// consecutive sweeps is declared dead.
    pub heartbeat_interval: Duration,
    /// How long an unanswered invite stays valid.
    pub invite_ttl: Duration,
    /// Cadence of the invite expiry sweep.
    pub invite_sweep_interval: Duration,
    /// Rating-window parameters for matchmaking.
    pub pairing: PairingConfig,
    /// Cadence of the matchmaking pairing pass.
    pub match_interval: Duration,
    /// A room with no activity for this long is reaped.
    pub room_idle_timeout: Duration,
    /// Cadence of the idle-room sweep.
    pub room_sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            auth_timeout: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(30),
            invite_ttl: Duration::from_secs(300),
            invite_sweep_interval: Duration::from_secs(60),
            pairing: PairingConfig::default(),
            match_interval: Duration::from_secs(5),
            room_idle_timeout: Duration::from_secs(900),
            room_sweep_interval: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_client_contract() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(cfg.invite_ttl, Duration::from_secs(300));
        assert_eq!(cfg.match_interval, Duration::from_secs(5));
        assert_eq!(cfg.room_idle_timeout, Duration::from_secs(900));
        assert_eq!(cfg.pairing.base_tolerance, 200);
        assert_eq!(cfg.pairing.widen_per_sec, 10);
    }
}
