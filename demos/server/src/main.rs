//! Development server: guest auth, default timers, verbose logging.
//!
//! Run with `RUST_LOG=tactix=debug cargo run` and point any client at
//! `ws://127.0.0.1:8080`.

use tactix::prelude::*;

/// Accepts any non-empty token and uses it as the user ID. The rating
/// snapshot is fixed, so every guest matches every other guest
/// immediately. Development only.
struct GuestAuth;

impl Authenticator for GuestAuth {
    async fn authenticate(&self, token: &str) -> Result<Identity, SessionError> {
        if token.is_empty() {
            return Err(SessionError::AuthFailed("empty token".into()));
        }
        Ok(Identity {
            user_id: UserId::from(token),
            username: format!("guest-{token}"),
            rating: 1000,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tactix=info".into()),
        )
        .init();

    let server = TactixServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build(GuestAuth)
        .await?;
    tracing::info!(addr = %server.local_addr()?, "tactix demo server listening");

    server.run().await?;
    Ok(())
}
