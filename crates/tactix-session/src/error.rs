//! Error types for the session layer.

/// Errors that can occur during authentication and registry handling.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential was invalid, expired, or rejected by the
    /// [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A privileged message arrived before the connection
    /// authenticated. The connection is closed with a policy
    /// violation, not answered.
    #[error("authentication required")]
    AuthRequired,
}
