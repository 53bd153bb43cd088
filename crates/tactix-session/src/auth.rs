//! Authentication hook for validating player identity.
//!
//! Tactix doesn't verify credentials itself — that's the job of an
//! external collaborator (JWT validation, an auth API, a cookie
//! session store). The core defines the [`Authenticator`] trait: one
//! async method mapping an opaque token to a durable [`Identity`].
//! The handshake calls it once per connection; everything downstream
//! trusts the result.

use tactix_protocol::UserId;

use crate::SessionError;

/// The durable, already-verified identity of a connected user.
///
/// `rating` is a snapshot supplied by the identity provider at
/// connect time — the matchmaking queue pairs on it, but the core
/// never computes or updates ratings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub rating: u32,
}

/// Validates a client's auth token and returns their identity.
///
/// # Example
///
/// ```rust
/// use tactix_session::{Authenticator, Identity, SessionError};
/// use tactix_protocol::UserId;
///
/// /// Accepts any non-empty token and uses it as the user ID.
/// /// Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(
///         &self,
///         token: &str,
///     ) -> Result<Identity, SessionError> {
///         if token.is_empty() {
///             return Err(SessionError::AuthFailed("empty token".into()));
///         }
///         Ok(Identity {
///             user_id: UserId::from(token),
///             username: format!("guest-{token}"),
///             rating: 1000,
///         })
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given token and returns who it belongs to.
    ///
    /// # Returns
    /// - `Ok(Identity)` — verified; the connection binds to this user
    /// - `Err(SessionError::AuthFailed)` — token invalid or expired
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Identity, SessionError>> + Send;
}
